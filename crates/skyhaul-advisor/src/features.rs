//! Feature vector for drone-leg time prediction.
//!
//! Field names and units follow the prediction service's model inputs:
//! distance in metres, speeds in m/s, payload in grams.

use serde::{Deserialize, Serialize};
use skyhaul_core::{km_to_m, DeliveryRequest, Drone, GeoPoint};

pub const DEFAULT_DISTANCE_M: f64 = 1000.0;
pub const DEFAULT_WIND_SPEED_MPS: f64 = 5.0;
pub const DEFAULT_ALTITUDE_M: f64 = 50.0;
pub const DEFAULT_SPEED_MPS: f64 = 10.0;
pub const DEFAULT_PAYLOAD_G: f64 = 1000.0;
pub const DEFAULT_ANGULAR_SPEED: f64 = 0.5;
/// Reference position used when no delivery location is known.
pub const DEFAULT_POSITION: GeoPoint = GeoPoint::new(12.9716, 77.5946);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneLegFeatures {
    pub distance: f64,
    pub wind_speed: f64,
    /// Longitude of the delivery
    pub position_x: f64,
    /// Latitude of the delivery
    pub position_y: f64,
    /// Cruise altitude in metres
    pub position_z: f64,
    pub speed: f64,
    /// Grams
    pub payload: f64,
    pub angular: f64,
}

impl Default for DroneLegFeatures {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE_M,
            wind_speed: DEFAULT_WIND_SPEED_MPS,
            position_x: DEFAULT_POSITION.lon,
            position_y: DEFAULT_POSITION.lat,
            position_z: DEFAULT_ALTITUDE_M,
            speed: DEFAULT_SPEED_MPS,
            payload: DEFAULT_PAYLOAD_G,
            angular: DEFAULT_ANGULAR_SPEED,
        }
    }
}

impl DroneLegFeatures {
    /// Features for flying `delivery` over a round trip of `round_trip_km`.
    ///
    /// Non-finite or negative inputs keep their defaults.
    pub fn for_leg(delivery: &DeliveryRequest, round_trip_km: f64, wind_speed_mps: f64) -> Self {
        let mut features = Self::default();
        if round_trip_km.is_finite() && round_trip_km >= 0.0 {
            features.distance = km_to_m(round_trip_km);
        }
        if wind_speed_mps.is_finite() && wind_speed_mps >= 0.0 {
            features.wind_speed = wind_speed_mps;
        }
        if delivery.location().is_valid() {
            features.position_x = delivery.lon;
            features.position_y = delivery.lat;
        }
        if delivery.weight_kg.is_finite() && delivery.weight_kg > 0.0 {
            features.payload = delivery.weight_kg * 1000.0;
        }
        features
    }
}

/// Drone record in the shape the prediction service expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneSummary {
    pub drone_id: String,
    pub payload_capacity: f64,
    pub battery_capacity: f64,
    pub battery_percent: f64,
}

impl From<&Drone> for DroneSummary {
    fn from(drone: &Drone) -> Self {
        Self {
            drone_id: drone.drone_id.clone(),
            payload_capacity: drone.payload_capacity_kg,
            battery_capacity: drone.battery_capacity,
            battery_percent: drone.current_battery_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_features_convert_units() {
        let delivery = DeliveryRequest::new(2.5, 13.0, 77.6);
        let features = DroneLegFeatures::for_leg(&delivery, 3.2, 7.0);
        assert_eq!(features.distance, 3200.0);
        assert_eq!(features.payload, 2500.0);
        assert_eq!(features.wind_speed, 7.0);
        assert_eq!(features.position_x, 77.6);
        assert_eq!(features.position_y, 13.0);
        assert_eq!(features.position_z, DEFAULT_ALTITUDE_M);
    }

    #[test]
    fn bad_inputs_keep_defaults() {
        let delivery = DeliveryRequest::new(f64::NAN, f64::NAN, 77.6);
        let features = DroneLegFeatures::for_leg(&delivery, f64::INFINITY, -1.0);
        assert_eq!(features, DroneLegFeatures::default());
    }
}
