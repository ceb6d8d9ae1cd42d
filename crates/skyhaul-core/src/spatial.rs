//! Spatial math for distance, projection and unit conversion.

use crate::models::GeoPoint;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

pub const KM_PER_MILE: f64 = 1.609_344;

/// Calculate great-circle distance in kilometres using the haversine formula.
///
/// NaN coordinates propagate to a NaN distance; callers validate inputs.
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance_km(a.lat, a.lon, b.lat, b.lon)
}

pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

pub fn km_to_m(km: f64) -> f64 {
    km * 1_000.0
}

/// Minutes needed to cover `km` at `speed_kmh`. A non-positive speed yields 0.
pub fn travel_minutes(km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 || !speed_kmh.is_finite() {
        return 0.0;
    }
    km / speed_kmh * 60.0
}

/// Total length of a polyline in kilometres.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_km(&pair[0], &pair[1]))
        .sum()
}

// ==== Local metric frame ====
// Latitude-aware metres-per-degree scaling, used to project points onto
// short segments without leaving lat/lon.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Fraction along segment `start -> end` of the closest point to `point`.
///
/// Works in a local east/north frame anchored at `start`, so it is only
/// meaningful for segments of city scale. Result is clamped to `[0, 1]`.
pub fn project_onto_segment(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64 {
    let ref_lat = start.lat;

    let px = (point.lon - start.lon) * meters_per_deg_lon(ref_lat);
    let py = (point.lat - start.lat) * meters_per_deg_lat(ref_lat);

    let sx = (end.lon - start.lon) * meters_per_deg_lon(ref_lat);
    let sy = (end.lat - start.lat) * meters_per_deg_lat(ref_lat);

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        // Segment is essentially a point
        return 0.0;
    }

    // t = ((P-A) · (B-A)) / |B-A|²
    let t = (px * sx + py * sy) / seg_len_sq;
    if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
