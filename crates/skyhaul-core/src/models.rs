//! Core data models for hybrid truck + drone trip planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// True when the point is finite and inside the valid lat/lon ranges.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Linear interpolation in lat/lon space. Good enough at city scale.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// A parcel to deliver. Identified by its position in the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Payload mass in kilograms
    #[serde(alias = "weight")]
    pub weight_kg: f64,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub lon: f64,
}

impl DeliveryRequest {
    pub fn new(weight_kg: f64, lat: f64, lon: f64) -> Self {
        Self { weight_kg, lat, lon }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Snapshot of a fleet drone as supplied by the fleet provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    #[serde(alias = "id", alias = "droneId")]
    pub drone_id: String,
    /// Maximum payload in kilograms
    #[serde(alias = "payload", alias = "payloadCapacity")]
    pub payload_capacity_kg: f64,
    #[serde(default, alias = "batteryCapacity")]
    pub battery_capacity: f64,
    #[serde(alias = "battery", alias = "currentBattery", alias = "currentBatteryPercent")]
    pub current_battery_percent: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Drone {
    pub fn new(drone_id: impl Into<String>, payload_capacity_kg: f64, current_battery_percent: f64) -> Self {
        Self {
            drone_id: drone_id.into(),
            payload_capacity_kg,
            battery_capacity: 0.0,
            current_battery_percent,
            available: true,
        }
    }

    /// Set the availability flag.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Whether this drone may carry `delivery` under the given battery floor.
    pub fn is_eligible_for(&self, delivery: &DeliveryRequest, min_battery_percent: f64) -> bool {
        self.available
            && self.payload_capacity_kg >= delivery.weight_kg
            && self.current_battery_percent >= min_battery_percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePointRole {
    Depot,
    TruckStop,
    LaunchPoint,
    DroneDeliveryPoint,
    LandingPoint,
}

/// A stop along the combined truck + drone traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub role: RoutePointRole,
    /// Index into the input delivery list for truck stops and the drone drop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_index: Option<usize>,
}

impl RoutePoint {
    pub fn new(point: GeoPoint, role: RoutePointRole) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            role,
            delivery_index: None,
        }
    }

    pub fn for_delivery(point: GeoPoint, role: RoutePointRole, delivery_index: usize) -> Self {
        Self {
            delivery_index: Some(delivery_index),
            ..Self::new(point, role)
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// How the drone-delivery candidate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionSource {
    /// The advisory hint was valid and feasible, enumeration was skipped
    Advisory { index: usize },
    /// Every candidate was evaluated and the lowest emission won
    Enumerated {
        candidates_evaluated: usize,
        feasible_candidates: usize,
    },
    /// A single fixed candidate was evaluated on request
    Direct,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolylineSource {
    /// Straight-line nearest-neighbour tour
    #[default]
    Synthetic,
    /// Road geometry from a directions service
    External,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegTimeSource {
    /// Distance over configured drone speed
    #[default]
    SpeedModel,
    /// Minutes supplied by the time-prediction oracle
    Oracle,
}

/// A planned hybrid trip. Built once per planning call and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub depot: GeoPoint,
    pub assigned_drone: Drone,
    pub drone_delivery_index: usize,
    pub drone_delivery: DeliveryRequest,
    /// Truck deliveries in input order (the drone delivery excluded)
    pub truck_deliveries: Vec<DeliveryRequest>,
    pub truck_delivery_indices: Vec<usize>,
    /// Full traversal: depot, truck stops, launch, drone drop, landing, truck stops, depot
    pub truck_route: Vec<RoutePoint>,
    pub launch: crate::launch::PolylinePosition,
    pub drone_round_trip_km: f64,
    pub truck_route_km: f64,
    pub truck_km_before_launch: f64,
    pub truck_km_after_launch: f64,
    pub baseline_truck_km: f64,
    /// Hybrid emission in kg CO2
    pub total_carbon_kg: f64,
    pub baseline_carbon_kg: f64,
    pub carbon_saved_kg: f64,
    pub carbon_reduction_percent: f64,
    pub truck_time_minutes: f64,
    pub drone_time_minutes: f64,
    pub total_trip_time_minutes: f64,
    pub baseline_time_minutes: f64,
    pub time_saved_minutes: f64,
    pub selection: SelectionSource,
    pub polyline_source: PolylineSource,
    pub drone_time_source: LegTimeSource,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Depot and truck stops in visiting order, the waypoints a directions
    /// service needs to draw the truck path.
    pub fn truck_waypoints(&self) -> Vec<GeoPoint> {
        self.truck_route
            .iter()
            .filter(|point| matches!(point.role, RoutePointRole::Depot | RoutePointRole::TruckStop))
            .map(RoutePoint::location)
            .collect()
    }

    /// Every numeric output is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.drone_round_trip_km,
            self.truck_route_km,
            self.truck_km_before_launch,
            self.truck_km_after_launch,
            self.baseline_truck_km,
            self.total_carbon_kg,
            self.baseline_carbon_kg,
            self.carbon_saved_kg,
            self.carbon_reduction_percent,
            self.truck_time_minutes,
            self.drone_time_minutes,
            self.total_trip_time_minutes,
            self.baseline_time_minutes,
            self.time_saved_minutes,
            self.launch.fraction,
            self.launch.distance_km,
        ]
        .iter()
        .all(|value| value.is_finite())
            && self.launch.point.is_finite()
    }
}

/// Result of a planning call. Infeasibility is an expected outcome, not an error.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "trip", rename_all = "snake_case")]
pub enum PlanOutcome {
    Planned(Trip),
    /// No eligible drone exists for any delivery
    Infeasible,
}

impl PlanOutcome {
    pub fn trip(&self) -> Option<&Trip> {
        match self {
            PlanOutcome::Planned(trip) => Some(trip),
            PlanOutcome::Infeasible => None,
        }
    }

    pub fn into_trip(self) -> Option<Trip> {
        match self {
            PlanOutcome::Planned(trip) => Some(trip),
            PlanOutcome::Infeasible => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanOutcome::Infeasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_eligibility_checks_every_rule() {
        let delivery = DeliveryRequest::new(2.0, 0.0, 0.0);
        assert!(Drone::new("D1", 2.0, 20.0).is_eligible_for(&delivery, 20.0));
        assert!(!Drone::new("D2", 1.9, 100.0).is_eligible_for(&delivery, 20.0));
        assert!(!Drone::new("D3", 5.0, 19.9).is_eligible_for(&delivery, 20.0));
        assert!(!Drone::new("D4", 5.0, 100.0)
            .with_available(false)
            .is_eligible_for(&delivery, 20.0));
    }

    #[test]
    fn deserializes_legacy_field_names() {
        let delivery: DeliveryRequest =
            serde_json::from_str(r#"{"weight": 1.5, "latitude": 12.97, "longitude": 77.59}"#)
                .unwrap();
        assert_eq!(delivery, DeliveryRequest::new(1.5, 12.97, 77.59));

        let drone: Drone =
            serde_json::from_str(r#"{"droneId": "DR-7", "payload": 3, "battery": 80}"#).unwrap();
        assert_eq!(drone.drone_id, "DR-7");
        assert!(drone.available);
        assert_eq!(drone.current_battery_percent, 80.0);
    }

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(12.9716, 77.5946).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        let mid = GeoPoint::new(0.0, 0.0).lerp(&GeoPoint::new(2.0, 4.0), 0.5);
        assert_eq!(mid, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn infeasible_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(PlanOutcome::Infeasible).unwrap();
        assert_eq!(json["status"], "infeasible");
    }
}
