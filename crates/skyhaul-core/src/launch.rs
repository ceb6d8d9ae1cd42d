//! Launch/landing point search along the truck polyline.
//!
//! The drone departs from, and returns to, the point on the truck path that
//! is closest to its delivery. Two search strategies are offered:
//!
//! - **Sampled**: evaluate evenly spaced points on every segment and keep the
//!   global minimum. Robust for road geometry returned by a directions service.
//! - **Exact**: closed-form perpendicular projection per segment, suited to the
//!   straight-line nearest-neighbour route.
//!
//! Segments are interpolated linearly in lat/lon, an approximation that holds
//! at city scale.

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;
use crate::rules::ProjectionMode;
use crate::spatial::{distance_km, project_onto_segment};

/// A location on a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylinePosition {
    pub point: GeoPoint,
    /// Segment `segment_index -> segment_index + 1` holding the point
    pub segment_index: usize,
    /// 0 = at the earlier vertex, 1 = at the later vertex
    pub fraction: f64,
    /// Distance from the point to the search target
    pub distance_km: f64,
}

/// Closest sampled point on `polyline` to `target`.
///
/// Each segment contributes `samples_per_segment + 1` evenly spaced points
/// (0 is treated as 1). The first strictly smaller distance wins, so ties
/// resolve to the earliest segment and fraction. A single-point polyline
/// returns that point; an empty one returns `None`.
pub fn locate(
    polyline: &[GeoPoint],
    target: GeoPoint,
    samples_per_segment: usize,
) -> Option<PolylinePosition> {
    if let Some(single) = degenerate(polyline, &target) {
        return single;
    }

    let samples = samples_per_segment.max(1);
    let mut best: Option<PolylinePosition> = None;

    for (segment_index, pair) in polyline.windows(2).enumerate() {
        for step in 0..=samples {
            let fraction = step as f64 / samples as f64;
            let point = pair[0].lerp(&pair[1], fraction);
            let candidate = PolylinePosition {
                point,
                segment_index,
                fraction,
                distance_km: distance_km(&point, &target),
            };
            best = Some(closer(best, candidate));
        }
    }

    best
}

/// Closest point on `polyline` to `target` via perpendicular projection.
pub fn locate_exact(polyline: &[GeoPoint], target: GeoPoint) -> Option<PolylinePosition> {
    if let Some(single) = degenerate(polyline, &target) {
        return single;
    }

    let mut best: Option<PolylinePosition> = None;
    for (segment_index, pair) in polyline.windows(2).enumerate() {
        let fraction = project_onto_segment(&target, &pair[0], &pair[1]);
        let point = pair[0].lerp(&pair[1], fraction);
        let candidate = PolylinePosition {
            point,
            segment_index,
            fraction,
            distance_km: distance_km(&point, &target),
        };
        best = Some(closer(best, candidate));
    }

    best
}

pub fn locate_with(
    polyline: &[GeoPoint],
    target: GeoPoint,
    mode: ProjectionMode,
) -> Option<PolylinePosition> {
    match mode {
        ProjectionMode::Sampled {
            samples_per_segment,
        } => locate(polyline, target, samples_per_segment),
        ProjectionMode::Exact => locate_exact(polyline, target),
    }
}

/// Distance travelled along `polyline` from its first vertex to `position`.
pub fn arc_length_km(polyline: &[GeoPoint], position: &PolylinePosition) -> f64 {
    let Some(segment_start) = polyline.get(position.segment_index) else {
        return crate::spatial::polyline_length_km(polyline);
    };

    let before: f64 = polyline[..=position.segment_index]
        .windows(2)
        .map(|pair| distance_km(&pair[0], &pair[1]))
        .sum();

    before + distance_km(segment_start, &position.point)
}

fn degenerate(polyline: &[GeoPoint], target: &GeoPoint) -> Option<Option<PolylinePosition>> {
    match polyline {
        [] => Some(None),
        [only] => Some(Some(PolylinePosition {
            point: *only,
            segment_index: 0,
            fraction: 0.0,
            distance_km: distance_km(only, target),
        })),
        _ => None,
    }
}

fn closer(best: Option<PolylinePosition>, candidate: PolylinePosition) -> PolylinePosition {
    match best {
        Some(current) if candidate.distance_km < current.distance_km => candidate,
        Some(current) => current,
        None => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::polyline_length_km;

    fn square_route() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.02),
            GeoPoint::new(0.02, 0.02),
            GeoPoint::new(0.0, 0.0),
        ]
    }

    #[test]
    fn empty_polyline_has_no_position() {
        assert!(locate(&[], GeoPoint::new(0.0, 0.0), 10).is_none());
        assert!(locate_exact(&[], GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn single_point_polyline_returns_it() {
        let only = GeoPoint::new(1.0, 1.0);
        let pos = locate(&[only], GeoPoint::new(0.0, 0.0), 10).unwrap();
        assert_eq!(pos.point, only);
        assert_eq!(pos.segment_index, 0);
        assert_eq!(pos.fraction, 0.0);
    }

    #[test]
    fn sampled_finds_segment_midpoint() {
        let route = square_route();
        let target = GeoPoint::new(-0.005, 0.01);
        let pos = locate(&route, target, 10).unwrap();
        assert_eq!(pos.segment_index, 0);
        assert!((pos.fraction - 0.5).abs() < 1e-9);
        assert!((pos.point.lon - 0.01).abs() < 1e-12);
    }

    #[test]
    fn exact_matches_sampled_on_aligned_target() {
        let route = square_route();
        let target = GeoPoint::new(0.01, 0.03);
        let sampled = locate(&route, target, 100).unwrap();
        let exact = locate_exact(&route, target).unwrap();
        assert_eq!(sampled.segment_index, exact.segment_index);
        assert!(exact.distance_km <= sampled.distance_km + 1e-6);
        assert!((exact.fraction - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_samples_falls_back_to_vertices() {
        let route = square_route();
        let pos = locate(&route, GeoPoint::new(0.021, 0.021), 0).unwrap();
        assert_eq!(pos.point, GeoPoint::new(0.0, 0.02).lerp(&GeoPoint::new(0.02, 0.02), 1.0));
    }

    #[test]
    fn arc_length_splits_polyline() {
        let route = square_route();
        let pos = locate(&route, GeoPoint::new(0.01, 0.03), 10).unwrap();
        let before = arc_length_km(&route, &pos);
        let total = polyline_length_km(&route);
        let first = distance_km(&route[0], &route[1]);
        assert!((before - (first + first / 2.0)).abs() < 1e-3, "got {before}");
        assert!(before < total);
    }

    #[test]
    fn arc_length_at_start_is_zero() {
        let route = square_route();
        let pos = locate(&route, GeoPoint::new(-0.01, -0.01), 10).unwrap();
        assert_eq!(pos.segment_index, 0);
        assert_eq!(pos.fraction, 0.0);
        assert_eq!(arc_length_km(&route, &pos), 0.0);
    }
}
