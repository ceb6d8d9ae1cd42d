//! Scoring of a single "delivery i goes by drone" hypothesis.
//!
//! For candidate `i` the remaining deliveries form a nearest-neighbour truck
//! tour, the drone launches from and lands back at the closest point on that
//! tour, and the trip is scored by combined CO2 emission against an
//! all-truck baseline over every delivery.

use chrono::Utc;

use crate::launch::{arc_length_km, locate_with, PolylinePosition};
use crate::models::{
    DeliveryRequest, Drone, GeoPoint, LegTimeSource, PolylineSource, RoutePoint, RoutePointRole,
    SelectionSource, Trip,
};
use crate::routing::{build_route, nearest_neighbor_order};
use crate::rules::{PlanningRules, ProjectionMode};
use crate::spatial::{polyline_length_km, travel_minutes};

/// Stops within this arc distance of the launch are visited before it.
const ARC_EPSILON_KM: f64 = 1e-9;

/// Shared read-only inputs for every candidate of one planning call.
#[derive(Debug, Clone)]
pub struct PlanningContext<'a> {
    depot: GeoPoint,
    deliveries: &'a [DeliveryRequest],
    fleet: &'a [Drone],
    rules: &'a PlanningRules,
    baseline_route: Vec<GeoPoint>,
    baseline_km: f64,
}

/// Closed nearest-neighbour tour over every delivery, the all-truck baseline.
pub fn baseline_waypoints(depot: GeoPoint, deliveries: &[DeliveryRequest]) -> Vec<GeoPoint> {
    let stops: Vec<GeoPoint> = deliveries.iter().map(DeliveryRequest::location).collect();
    build_route(depot, &stops)
}

impl<'a> PlanningContext<'a> {
    /// Build the context and the all-truck baseline tour once.
    pub fn new(
        depot: GeoPoint,
        deliveries: &'a [DeliveryRequest],
        fleet: &'a [Drone],
        rules: &'a PlanningRules,
    ) -> Self {
        let baseline_route = baseline_waypoints(depot, deliveries);
        let baseline_km = polyline_length_km(&baseline_route);
        Self {
            depot,
            deliveries,
            fleet,
            rules,
            baseline_route,
            baseline_km,
        }
    }

    pub fn depot(&self) -> GeoPoint {
        self.depot
    }

    pub fn deliveries(&self) -> &'a [DeliveryRequest] {
        self.deliveries
    }

    pub fn fleet(&self) -> &'a [Drone] {
        self.fleet
    }

    pub fn rules(&self) -> &'a PlanningRules {
        self.rules
    }

    pub fn baseline_route(&self) -> &[GeoPoint] {
        &self.baseline_route
    }

    /// Straight-line length of the tour visiting every delivery by truck.
    pub fn baseline_km(&self) -> f64 {
        self.baseline_km
    }
}

/// Inputs supplied by external collaborators for a single evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationOverrides<'p> {
    /// Road geometry for the truck tour, replacing the straight-line route
    pub polyline: Option<&'p [GeoPoint]>,
    /// Road geometry for the all-truck baseline tour. Only honoured when
    /// `polyline` is, so both distances are measured the same way.
    pub baseline_polyline: Option<&'p [GeoPoint]>,
    /// Predicted minutes for the whole drone leg
    pub drone_leg_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEvaluation {
    pub index: usize,
    /// Comparison key between candidates
    pub hybrid_carbon_kg: f64,
    pub trip: Trip,
}

/// First drone in fleet order that can carry `delivery`.
pub fn first_eligible_drone<'f>(
    fleet: &'f [Drone],
    delivery: &DeliveryRequest,
    min_battery_percent: f64,
) -> Option<&'f Drone> {
    fleet
        .iter()
        .find(|drone| drone.is_eligible_for(delivery, min_battery_percent))
}

/// Delivery indices the truck visits, in order, when `candidate` flies.
pub fn truck_visit_order(
    depot: GeoPoint,
    deliveries: &[DeliveryRequest],
    candidate: usize,
) -> Vec<usize> {
    let truck_indices: Vec<usize> = (0..deliveries.len()).filter(|&idx| idx != candidate).collect();
    let stops: Vec<GeoPoint> = truck_indices
        .iter()
        .map(|&idx| deliveries[idx].location())
        .collect();

    nearest_neighbor_order(depot, &stops)
        .into_iter()
        .map(|k| truck_indices[k])
        .collect()
}

/// Score candidate `index`. Returns `None` when the index is out of range
/// or no drone is eligible for that delivery.
pub fn evaluate_candidate(
    ctx: &PlanningContext<'_>,
    index: usize,
    overrides: &EvaluationOverrides<'_>,
) -> Option<CandidateEvaluation> {
    let rules = ctx.rules;
    let drone_delivery = ctx.deliveries.get(index)?;
    let drone = first_eligible_drone(ctx.fleet, drone_delivery, rules.min_battery_percent)?;
    let target = drone_delivery.location();

    let visit_order = truck_visit_order(ctx.depot, ctx.deliveries, index);

    let synthetic: Vec<GeoPoint> = std::iter::once(ctx.depot)
        .chain(visit_order.iter().map(|&idx| ctx.deliveries[idx].location()))
        .chain(std::iter::once(ctx.depot))
        .collect();

    let (polyline, polyline_source) = match overrides.polyline {
        Some(points) if usable_polyline(points) => (points, PolylineSource::External),
        _ => (synthetic.as_slice(), PolylineSource::Synthetic),
    };

    let launch = locate_with(polyline, target, rules.projection)?;

    // Distances
    let drone_round_trip_km = 2.0 * launch.distance_km;
    let truck_route_km = polyline_length_km(polyline);
    let launch_arc_km = arc_length_km(polyline, &launch).min(truck_route_km);
    let truck_km_before_launch = launch_arc_km;
    let truck_km_after_launch = (truck_route_km - launch_arc_km).max(0.0);
    let baseline_truck_km = match overrides.baseline_polyline {
        Some(points) if polyline_source == PolylineSource::External && usable_polyline(points) => {
            polyline_length_km(points)
        }
        _ => ctx.baseline_km,
    };

    // Emissions
    let total_carbon_kg = truck_route_km * rules.truck_emission_kg_per_km
        + drone_round_trip_km * rules.drone_emission_kg_per_km;
    let baseline_carbon_kg = baseline_truck_km * rules.truck_emission_kg_per_km;
    let carbon_reduction_percent = if baseline_carbon_kg > 0.0 {
        (baseline_carbon_kg - total_carbon_kg) / baseline_carbon_kg * 100.0
    } else {
        0.0
    };

    // Times
    let truck_time_minutes = travel_minutes(truck_route_km, rules.truck_speed_kmh);
    let (drone_time_minutes, drone_time_source) = match overrides
        .drone_leg_minutes
        .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
    {
        Some(minutes) => (minutes, LegTimeSource::Oracle),
        None => (
            travel_minutes(drone_round_trip_km, rules.drone_speed_kmh),
            LegTimeSource::SpeedModel,
        ),
    };
    let total_trip_time_minutes = truck_time_minutes + drone_time_minutes;
    let baseline_time_minutes = travel_minutes(baseline_truck_km, rules.truck_speed_kmh);

    // Stops whose arc position lies past the launch are served after landing.
    let stops = visit_order.iter().map(|&idx| ctx.deliveries[idx].location());
    let split = stop_arcs_km(polyline, stops, rules.projection)
        .iter()
        .position(|&arc| arc > launch_arc_km + ARC_EPSILON_KM)
        .unwrap_or(visit_order.len());

    let mut truck_route = Vec::with_capacity(visit_order.len() + 5);
    truck_route.push(RoutePoint::new(ctx.depot, RoutePointRole::Depot));
    truck_route.extend(visit_order[..split].iter().map(|&idx| {
        RoutePoint::for_delivery(ctx.deliveries[idx].location(), RoutePointRole::TruckStop, idx)
    }));
    truck_route.push(RoutePoint::new(launch.point, RoutePointRole::LaunchPoint));
    truck_route.push(RoutePoint::for_delivery(
        target,
        RoutePointRole::DroneDeliveryPoint,
        index,
    ));
    truck_route.push(RoutePoint::new(launch.point, RoutePointRole::LandingPoint));
    truck_route.extend(visit_order[split..].iter().map(|&idx| {
        RoutePoint::for_delivery(ctx.deliveries[idx].location(), RoutePointRole::TruckStop, idx)
    }));
    truck_route.push(RoutePoint::new(ctx.depot, RoutePointRole::Depot));

    let truck_delivery_indices: Vec<usize> =
        (0..ctx.deliveries.len()).filter(|&idx| idx != index).collect();
    let truck_deliveries = truck_delivery_indices
        .iter()
        .map(|&idx| ctx.deliveries[idx].clone())
        .collect();

    let trip = Trip {
        depot: ctx.depot,
        assigned_drone: drone.clone(),
        drone_delivery_index: index,
        drone_delivery: drone_delivery.clone(),
        truck_deliveries,
        truck_delivery_indices,
        truck_route,
        launch,
        drone_round_trip_km,
        truck_route_km,
        truck_km_before_launch,
        truck_km_after_launch,
        baseline_truck_km,
        total_carbon_kg,
        baseline_carbon_kg,
        carbon_saved_kg: baseline_carbon_kg - total_carbon_kg,
        carbon_reduction_percent,
        truck_time_minutes,
        drone_time_minutes,
        total_trip_time_minutes,
        baseline_time_minutes,
        time_saved_minutes: baseline_time_minutes - total_trip_time_minutes,
        selection: SelectionSource::Direct,
        polyline_source,
        drone_time_source,
        created_at: Utc::now(),
    };

    Some(CandidateEvaluation {
        index,
        hybrid_carbon_kg: total_carbon_kg,
        trip,
    })
}

/// Arc position of each stop, in visit order.
///
/// Each stop is searched for only on the part of `polyline` past the previous
/// stop, so road geometry that doubles back still yields non-decreasing arcs.
fn stop_arcs_km(
    polyline: &[GeoPoint],
    stops: impl Iterator<Item = GeoPoint>,
    mode: ProjectionMode,
) -> Vec<f64> {
    let mut from: Option<(PolylinePosition, f64)> = None;
    let mut arcs = Vec::new();

    for stop in stops {
        let next = match from {
            None => locate_with(polyline, stop, mode).map(|pos| (pos, arc_length_km(polyline, &pos))),
            Some((prev, prev_arc)) => {
                let remaining: Vec<GeoPoint> = std::iter::once(prev.point)
                    .chain(polyline[prev.segment_index + 1..].iter().copied())
                    .collect();
                locate_with(&remaining, stop, mode).map(|pos| {
                    let arc = prev_arc + arc_length_km(&remaining, &pos);
                    let segment_index = if pos.segment_index == 0 {
                        prev.segment_index
                    } else {
                        prev.segment_index + pos.segment_index
                    };
                    (PolylinePosition { segment_index, ..pos }, arc)
                })
            }
        };
        from = next.or(from);
        arcs.push(from.map_or(0.0, |(_, arc)| arc));
    }

    arcs
}

fn usable_polyline(points: &[GeoPoint]) -> bool {
    points.len() >= 2 && points.iter().all(GeoPoint::is_valid)
}
