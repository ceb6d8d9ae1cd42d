//! Nearest-neighbour sequencing of truck stops.
//!
//! Starting at the depot, greedily visit the closest unvisited stop and
//! return to the depot at the end. O(n²) in stop count, which is fine for
//! delivery batches of tens of stops. Not an optimal TSP tour.

use crate::models::GeoPoint;
use crate::spatial::distance_km;

/// Visiting order over `stops` as indices into the slice.
///
/// Ties go to the stop that appears first in `stops`.
pub fn nearest_neighbor_order(depot: GeoPoint, stops: &[GeoPoint]) -> Vec<usize> {
    let mut visited = vec![false; stops.len()];
    let mut order = Vec::with_capacity(stops.len());
    let mut current = depot;

    while order.len() < stops.len() {
        let mut best: Option<(usize, f64)> = None;
        for (idx, stop) in stops.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            let dist = distance_km(&current, stop);
            let closer = match best {
                Some((_, best_dist)) => dist < best_dist,
                None => true,
            };
            if closer {
                best = Some((idx, dist));
            }
        }

        let Some((next, _)) = best else {
            break;
        };
        visited[next] = true;
        order.push(next);
        current = stops[next];
    }

    order
}

/// Closed tour `[depot, s_i1, ..., s_in, depot]`.
///
/// Zero stops gives `[depot, depot]`.
pub fn build_route(depot: GeoPoint, stops: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut route = Vec::with_capacity(stops.len() + 2);
    route.push(depot);
    route.extend(nearest_neighbor_order(depot, stops).into_iter().map(|idx| stops[idx]));
    route.push(depot);
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stops_round_trip_at_depot() {
        let depot = GeoPoint::new(12.9716, 77.5946);
        assert_eq!(build_route(depot, &[]), vec![depot, depot]);
    }

    #[test]
    fn visits_closest_stop_first() {
        let depot = GeoPoint::new(0.0, 0.0);
        let stops = [
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
        ];
        assert_eq!(nearest_neighbor_order(depot, &stops), vec![1, 2, 0]);
    }

    #[test]
    fn ties_go_to_first_encountered() {
        let depot = GeoPoint::new(0.0, 0.0);
        let stops = [GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, -1.0)];
        assert_eq!(nearest_neighbor_order(depot, &stops), vec![0, 1]);
    }

    #[test]
    fn duplicate_stops_are_each_visited_once() {
        let depot = GeoPoint::new(0.0, 0.0);
        let stop = GeoPoint::new(0.1, 0.1);
        let route = build_route(depot, &[stop, stop, depot]);
        assert_eq!(route.len(), 5);
        assert_eq!(route.first(), Some(&depot));
        assert_eq!(route.last(), Some(&depot));
    }
}
