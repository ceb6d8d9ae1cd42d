//! Planning policy constants and tunables.

use serde::{Deserialize, Serialize};

use crate::spatial::KM_PER_MILE;

/// Truck emission in kg CO2 per mile.
pub const TRUCK_EMISSION_KG_PER_MILE: f64 = 1.2;
/// Drone emission in kg CO2 per mile (1/12 of the truck).
pub const DRONE_EMISSION_KG_PER_MILE: f64 = 0.1;
pub const TRUCK_EMISSION_KG_PER_KM: f64 = TRUCK_EMISSION_KG_PER_MILE / KM_PER_MILE;
pub const DRONE_EMISSION_KG_PER_KM: f64 = DRONE_EMISSION_KG_PER_MILE / KM_PER_MILE;
pub const TRUCK_SPEED_KMH: f64 = 30.0;
pub const DRONE_SPEED_KMH: f64 = 40.0;
pub const MIN_BATTERY_THRESHOLD: f64 = 20.0;
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 50;

/// How launch points are projected onto the truck polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Evenly spaced samples per segment; tolerant of road geometry
    Sampled { samples_per_segment: usize },
    /// Closed-form point-to-segment projection
    Exact,
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Sampled {
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
        }
    }
}

/// Configuration for trip planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRules {
    /// kg CO2 per truck kilometre
    pub truck_emission_kg_per_km: f64,
    /// kg CO2 per drone kilometre
    pub drone_emission_kg_per_km: f64,
    pub truck_speed_kmh: f64,
    pub drone_speed_kmh: f64,
    /// Drones below this charge are never dispatched
    pub min_battery_percent: f64,
    pub projection: ProjectionMode,
}

impl Default for PlanningRules {
    fn default() -> Self {
        Self {
            truck_emission_kg_per_km: TRUCK_EMISSION_KG_PER_KM,
            drone_emission_kg_per_km: DRONE_EMISSION_KG_PER_KM,
            truck_speed_kmh: TRUCK_SPEED_KMH,
            drone_speed_kmh: DRONE_SPEED_KMH,
            min_battery_percent: MIN_BATTERY_THRESHOLD,
            projection: ProjectionMode::default(),
        }
    }
}

impl PlanningRules {
    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }

    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let rates = [
            ("truck_emission_kg_per_km", self.truck_emission_kg_per_km),
            ("drone_emission_kg_per_km", self.drone_emission_kg_per_km),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be a non-negative number, got {value}"));
            }
        }

        let speeds = [
            ("truck_speed_kmh", self.truck_speed_kmh),
            ("drone_speed_kmh", self.drone_speed_kmh),
        ];
        for (name, value) in speeds {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} must be positive, got {value}"));
            }
        }

        if !(0.0..=100.0).contains(&self.min_battery_percent) {
            errors.push(format!(
                "min_battery_percent must be within 0..=100, got {}",
                self.min_battery_percent
            ));
        }

        if let ProjectionMode::Sampled { samples_per_segment: 0 } = self.projection {
            errors.push("samples_per_segment must be at least 1".to_string());
        }

        errors
    }
}
