//! Trip planning service.
//!
//! Wraps the pure planner with its external collaborators: advisory hints,
//! road geometry, drone-leg time prediction, the fleet snapshot and the trip
//! history. External calls are bounded by timeouts and degrade to the local
//! answer on any failure.

pub mod config;
pub mod planner;
pub mod store;

pub use config::Config;
pub use planner::{PlanRequest, PlanningService, ServiceSettings};
pub use store::{FleetProvider, InMemoryFleet, InMemoryTripRepository, StoredTrip, TripRepository};
