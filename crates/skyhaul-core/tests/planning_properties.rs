//! Planning properties and reference scenarios.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyhaul_core::{
    build_route, distance_km, plan, DeliveryRequest, Drone, EvaluationOverrides, GeoPoint,
    PlanOutcome, PlanningRules, SelectionSource, TripOptimizer,
};

const BANGALORE: GeoPoint = GeoPoint::new(12.9716, 77.5946);

fn random_deliveries(rng: &mut StdRng, count: usize) -> Vec<DeliveryRequest> {
    (0..count)
        .map(|_| {
            DeliveryRequest::new(
                rng.random_range(0.2..4.0),
                BANGALORE.lat + rng.random_range(-0.08..0.08),
                BANGALORE.lon + rng.random_range(-0.08..0.08),
            )
        })
        .collect()
}

fn random_fleet(rng: &mut StdRng) -> Vec<Drone> {
    (0..rng.random_range(1..5))
        .map(|i| {
            Drone::new(
                format!("DR-{i}"),
                rng.random_range(0.5..5.0),
                rng.random_range(0.0..100.0),
            )
            .with_available(rng.random_bool(0.8))
        })
        .collect()
}

#[test]
fn partition_is_exhaustive_and_disjoint() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let count = rng.random_range(1..12);
        let deliveries = random_deliveries(&mut rng, count);
        let fleet = random_fleet(&mut rng);

        let Some(trip) = plan(BANGALORE, &deliveries, &fleet, None).unwrap().into_trip() else {
            continue;
        };

        let mut seen: Vec<usize> = trip.truck_delivery_indices.clone();
        assert!(!seen.contains(&trip.drone_delivery_index));
        seen.push(trip.drone_delivery_index);
        seen.sort_unstable();
        assert_eq!(seen, (0..count).collect::<Vec<_>>());

        assert_eq!(trip.drone_delivery, deliveries[trip.drone_delivery_index]);
        for (delivery, &idx) in trip.truck_deliveries.iter().zip(&trip.truck_delivery_indices) {
            assert_eq!(delivery, &deliveries[idx]);
        }
    }
}

#[test]
fn route_is_closed_and_visits_every_stop_once() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let count = rng.random_range(0..15);
        let stops: Vec<GeoPoint> = random_deliveries(&mut rng, count)
            .iter()
            .map(DeliveryRequest::location)
            .collect();

        let route = build_route(BANGALORE, &stops);
        assert_eq!(route.len(), count + 2);
        assert_eq!(route.first(), Some(&BANGALORE));
        assert_eq!(route.last(), Some(&BANGALORE));

        let mut interior = route[1..route.len() - 1].to_vec();
        let mut expected = stops.clone();
        let key = |p: &GeoPoint| (p.lat.to_bits(), p.lon.to_bits());
        interior.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(interior, expected);
    }
}

#[test]
fn ineligible_drones_are_never_selected() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let count = rng.random_range(1..8);
        let deliveries = random_deliveries(&mut rng, count);
        let fleet = random_fleet(&mut rng);

        if let Some(trip) = plan(BANGALORE, &deliveries, &fleet, None).unwrap().into_trip() {
            let drone = &trip.assigned_drone;
            assert!(drone.available);
            assert!(drone.payload_capacity_kg >= trip.drone_delivery.weight_kg);
            assert!(drone.current_battery_percent >= 20.0);
        } else {
            for delivery in &deliveries {
                assert!(!fleet.iter().any(|d| d.is_eligible_for(delivery, 20.0)));
            }
        }
    }
}

#[test]
fn chosen_candidate_has_minimal_emission() {
    let mut rng = StdRng::seed_from_u64(31);
    let optimizer = TripOptimizer::default();
    for _ in 0..100 {
        let count = rng.random_range(1..10);
        let deliveries = random_deliveries(&mut rng, count);
        let fleet = random_fleet(&mut rng);

        let outcome = optimizer.plan(BANGALORE, &deliveries, &fleet, None).unwrap();
        let all = optimizer.evaluate_all(BANGALORE, &deliveries, &fleet).unwrap();
        match outcome {
            PlanOutcome::Planned(trip) => {
                for other in &all {
                    assert!(trip.total_carbon_kg <= other.hybrid_carbon_kg + 1e-12);
                }
                let first_min = all
                    .iter()
                    .find(|e| e.hybrid_carbon_kg == trip.total_carbon_kg)
                    .unwrap();
                assert_eq!(first_min.index, trip.drone_delivery_index);
            }
            PlanOutcome::Infeasible => assert!(all.is_empty()),
        }
    }
}

#[test]
fn bad_hints_never_leak_into_the_result() {
    let deliveries = vec![
        DeliveryRequest::new(9.0, 12.98, 77.60),
        DeliveryRequest::new(1.0, 12.99, 77.61),
        DeliveryRequest::new(1.0, 13.05, 77.70),
    ];
    let fleet = vec![Drone::new("DR-1", 2.0, 60.0)];
    let unhinted = plan(BANGALORE, &deliveries, &fleet, None).unwrap().into_trip().unwrap();

    for hint in [0, 3, usize::MAX] {
        let trip = plan(BANGALORE, &deliveries, &fleet, Some(hint))
            .unwrap()
            .into_trip()
            .unwrap();
        assert_eq!(trip.drone_delivery_index, unhinted.drone_delivery_index);
        assert!(matches!(trip.selection, SelectionSource::Enumerated { .. }));
    }
}

#[test]
fn broken_external_inputs_keep_every_field_finite() {
    let deliveries = vec![
        DeliveryRequest::new(1.0, 12.98, 77.60),
        DeliveryRequest::new(1.0, 12.99, 77.61),
    ];
    let fleet = vec![Drone::new("DR-1", 2.0, 60.0)];
    let optimizer = TripOptimizer::default();
    let bad_polyline = [GeoPoint::new(f64::INFINITY, 0.0), GeoPoint::new(0.0, f64::NAN)];

    let outcome = optimizer
        .plan_candidate(
            BANGALORE,
            &deliveries,
            &fleet,
            1,
            &EvaluationOverrides {
                polyline: Some(&bad_polyline),
                baseline_polyline: Some(&bad_polyline),
                drone_leg_minutes: Some(f64::NAN),
            },
        )
        .unwrap();
    let trip = outcome.into_trip().unwrap();
    assert!(trip.is_finite());
}

#[test]
fn scenario_a_two_opposite_deliveries() {
    let depot = GeoPoint::new(0.0, 0.0);
    let deliveries = vec![
        DeliveryRequest::new(1.0, 0.0, 1.0),
        DeliveryRequest::new(1.0, 0.0, -1.0),
    ];
    let fleet = vec![Drone::new("DR-1", 2.0, 100.0)];

    let trip = plan(depot, &deliveries, &fleet, None).unwrap().into_trip().unwrap();
    assert_eq!(trip.truck_deliveries.len(), 1);
    assert!(trip.carbon_reduction_percent > 0.0);
    assert!(trip.time_saved_minutes.is_finite());
}

#[test]
fn scenario_b_low_battery_is_infeasible() {
    let depot = GeoPoint::new(0.0, 0.0);
    let deliveries = vec![
        DeliveryRequest::new(1.0, 0.0, 1.0),
        DeliveryRequest::new(1.0, 0.0, -1.0),
    ];
    let fleet = vec![Drone::new("DR-1", 2.0, 10.0)];

    assert_eq!(plan(depot, &deliveries, &fleet, None), Ok(PlanOutcome::Infeasible));
}

#[test]
fn scenario_c_delivery_at_depot() {
    let depot = GeoPoint::new(12.9716, 77.5946);
    let deliveries = vec![DeliveryRequest::new(1.0, depot.lat, depot.lon)];
    let fleet = vec![Drone::new("DR-1", 2.0, 100.0)];

    let trip = plan(depot, &deliveries, &fleet, None).unwrap().into_trip().unwrap();
    assert_eq!(trip.drone_round_trip_km, 0.0);
    assert_eq!(trip.baseline_carbon_kg, 0.0);
    assert_eq!(trip.carbon_reduction_percent, 0.0);
    assert!(trip.is_finite());
}

#[test]
fn scenario_d_five_deliveries_manual_minimum() {
    // Four drops hug the depot along one street; the fifth sits 10 km north.
    let depot = GeoPoint::new(0.0, 0.0);
    let deliveries = vec![
        DeliveryRequest::new(1.0, 0.0, 0.01),
        DeliveryRequest::new(1.0, 0.0, 0.02),
        DeliveryRequest::new(1.0, 0.0, 0.03),
        DeliveryRequest::new(1.0, 0.0, 0.04),
        DeliveryRequest::new(1.0, 0.09, 0.04),
    ];
    let fleet = vec![Drone::new("DR-1", 2.0, 100.0)];
    let rules = PlanningRules::default();
    let optimizer = TripOptimizer::new(rules.clone());

    let all = optimizer.evaluate_all(depot, &deliveries, &fleet).unwrap();
    assert_eq!(all.len(), 5);

    // Candidate 4: the truck runs the street and back, the drone leaves from
    // the street end at (0, 0.04).
    let street_end = GeoPoint::new(0.0, 0.04);
    let truck_km = 2.0 * distance_km(&depot, &street_end);
    let drone_km = 2.0 * distance_km(&street_end, &deliveries[4].location());
    let expected = truck_km * rules.truck_emission_kg_per_km + drone_km * rules.drone_emission_kg_per_km;
    assert!((all[4].hybrid_carbon_kg - expected).abs() < 1e-9);

    for other in &all[..4] {
        assert!(all[4].hybrid_carbon_kg < other.hybrid_carbon_kg);
    }

    let trip = optimizer
        .plan(depot, &deliveries, &fleet, None)
        .unwrap()
        .into_trip()
        .unwrap();
    assert_eq!(trip.drone_delivery_index, 4);
    assert_eq!(
        trip.selection,
        SelectionSource::Enumerated {
            candidates_evaluated: 5,
            feasible_candidates: 5,
        }
    );
}
