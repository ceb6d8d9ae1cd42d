pub mod error;
pub mod evaluator;
pub mod launch;
pub mod models;
pub mod optimizer;
pub mod routing;
pub mod rules;
pub mod spatial;

pub use error::{validate_inputs, PlanError};
pub use evaluator::{
    baseline_waypoints, evaluate_candidate, first_eligible_drone, truck_visit_order,
    CandidateEvaluation, EvaluationOverrides, PlanningContext,
};
pub use launch::{arc_length_km, locate, locate_exact, locate_with, PolylinePosition};
pub use models::{
    DeliveryRequest, Drone, GeoPoint, LegTimeSource, PlanOutcome, PolylineSource, RoutePoint,
    RoutePointRole, SelectionSource, Trip,
};
pub use optimizer::{plan, TripOptimizer};
pub use routing::{build_route, nearest_neighbor_order};
pub use rules::{PlanningRules, ProjectionMode};
pub use spatial::{distance_km, km_to_m, km_to_miles, miles_to_km, polyline_length_km};
