//! Input validation and the hard-failure error type.
//!
//! Only malformed input is an error. A plan with no eligible drone is a
//! regular [`crate::PlanOutcome::Infeasible`] result.

use thiserror::Error;

use crate::models::{DeliveryRequest, Drone, GeoPoint};
use crate::rules::PlanningRules;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("at least one delivery is required")]
    NoDeliveries,
    #[error("depot has invalid coordinates ({lat}, {lon})")]
    InvalidDepot { lat: f64, lon: f64 },
    #[error("delivery {index} has invalid weight {weight_kg}")]
    InvalidWeight { index: usize, weight_kg: f64 },
    #[error("delivery {index} has invalid coordinates ({lat}, {lon})")]
    InvalidDeliveryLocation { index: usize, lat: f64, lon: f64 },
    #[error("drone {index} is malformed: {reason}")]
    InvalidDrone { index: usize, reason: String },
    #[error("planning rules are invalid: {0}")]
    InvalidRules(String),
}

/// Check every planning input before it reaches the optimizer.
pub fn validate_inputs(
    depot: &GeoPoint,
    deliveries: &[DeliveryRequest],
    fleet: &[Drone],
    rules: &PlanningRules,
) -> Result<(), PlanError> {
    let rule_errors = rules.validate();
    if !rule_errors.is_empty() {
        return Err(PlanError::InvalidRules(rule_errors.join("; ")));
    }

    if !depot.is_valid() {
        return Err(PlanError::InvalidDepot {
            lat: depot.lat,
            lon: depot.lon,
        });
    }

    if deliveries.is_empty() {
        return Err(PlanError::NoDeliveries);
    }

    for (index, delivery) in deliveries.iter().enumerate() {
        if !delivery.weight_kg.is_finite() || delivery.weight_kg <= 0.0 {
            return Err(PlanError::InvalidWeight {
                index,
                weight_kg: delivery.weight_kg,
            });
        }
        if !delivery.location().is_valid() {
            return Err(PlanError::InvalidDeliveryLocation {
                index,
                lat: delivery.lat,
                lon: delivery.lon,
            });
        }
    }

    for (index, drone) in fleet.iter().enumerate() {
        if let Some(reason) = drone_problem(drone) {
            return Err(PlanError::InvalidDrone { index, reason });
        }
    }

    Ok(())
}

fn drone_problem(drone: &Drone) -> Option<String> {
    if drone.drone_id.trim().is_empty() {
        return Some("drone id is empty".to_string());
    }
    if !drone.payload_capacity_kg.is_finite() || drone.payload_capacity_kg < 0.0 {
        return Some(format!(
            "payload capacity must be a non-negative number, got {}",
            drone.payload_capacity_kg
        ));
    }
    if !drone.battery_capacity.is_finite() || drone.battery_capacity < 0.0 {
        return Some(format!(
            "battery capacity must be a non-negative number, got {}",
            drone.battery_capacity
        ));
    }
    if !(0.0..=100.0).contains(&drone.current_battery_percent) {
        return Some(format!(
            "battery percent must be within 0..=100, got {}",
            drone.current_battery_percent
        ));
    }
    None
}
