//! In-process geographic outlier advisor.
//!
//! Picks the delivery that sits apart from the rest: coordinates (depot
//! first) are z-score standardized and split into two clusters with a
//! deterministic 2-means; the member of the smaller cluster farthest from its
//! centroid is the suggested drone delivery.

use skyhaul_core::{DeliveryRequest, Drone, GeoPoint};

use crate::error::AdvisorError;
use crate::features::DroneLegFeatures;
use crate::oracle::AdvisoryOracle;

const DEFAULT_MAX_ITERATIONS: usize = 100;

type Point = [f64; 2];

#[derive(Debug, Clone, Copy)]
pub struct OutlierAdvisor {
    max_iterations: usize,
}

impl Default for OutlierAdvisor {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl OutlierAdvisor {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
        }
    }

    /// Synchronous form of [`AdvisoryOracle::suggest_drone_index`].
    pub fn suggest(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> Result<usize, AdvisorError> {
        let coordinates: Vec<GeoPoint> = std::iter::once(depot)
            .chain(deliveries.iter().map(DeliveryRequest::location))
            .collect();

        let position = outlier_position(&coordinates, self.max_iterations);
        if position == 0 {
            return Err(AdvisorError::Unavailable(
                "outlier detection picked the depot".to_string(),
            ));
        }

        let index = position - 1;
        if index >= deliveries.len() {
            return Err(AdvisorError::IndexOutOfRange {
                index: index as i64,
                len: deliveries.len(),
            });
        }

        tracing::debug!(index, deliveries = deliveries.len(), "Local outlier advisor suggestion");
        Ok(index)
    }
}

impl AdvisoryOracle for OutlierAdvisor {
    async fn suggest_drone_index(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> Result<usize, AdvisorError> {
        self.suggest(depot, deliveries)
    }

    async fn predict_drone_leg_minutes(
        &self,
        _features: &DroneLegFeatures,
        _fleet: &[Drone],
    ) -> Result<f64, AdvisorError> {
        Err(AdvisorError::Unavailable(
            "no local drone-leg time model".to_string(),
        ))
    }
}

/// Position of the outlier within `coordinates` with default iterations.
///
/// Fewer than three coordinates always answer position 1.
pub fn find_outlier_position(coordinates: &[GeoPoint]) -> usize {
    outlier_position(coordinates, DEFAULT_MAX_ITERATIONS)
}

fn outlier_position(coordinates: &[GeoPoint], max_iterations: usize) -> usize {
    if coordinates.len() < 3 {
        return 1;
    }

    let scaled = standardize(coordinates);
    if scaled.len() == 3 {
        return farthest_from(&scaled, &mean(&scaled));
    }

    let (labels, centroids) = two_means(&scaled, max_iterations);
    let counts = [
        labels.iter().filter(|&&label| label == 0).count(),
        labels.iter().filter(|&&label| label == 1).count(),
    ];
    if counts.contains(&0) {
        return farthest_from(&scaled, &mean(&scaled));
    }

    let outlier_label = if counts[1] < counts[0] { 1 } else { 0 };
    let members: Vec<usize> = (0..scaled.len())
        .filter(|&idx| labels[idx] == outlier_label)
        .collect();
    let member_points: Vec<Point> = members.iter().map(|&idx| scaled[idx]).collect();

    members[farthest_from(&member_points, &centroids[outlier_label])]
}

/// Zero mean, unit (population) variance per axis. Constant axes become 0.
fn standardize(coordinates: &[GeoPoint]) -> Vec<Point> {
    let raw: Vec<Point> = coordinates.iter().map(|p| [p.lat, p.lon]).collect();
    let center = mean(&raw);
    let n = raw.len() as f64;
    let spread = |axis: usize| {
        (raw.iter().map(|p| (p[axis] - center[axis]).powi(2)).sum::<f64>() / n).sqrt()
    };
    let scale = [spread(0), spread(1)];

    let z = |value: f64, axis: usize| {
        if scale[axis] > 0.0 && scale[axis].is_finite() {
            (value - center[axis]) / scale[axis]
        } else {
            0.0
        }
    };
    raw.iter().map(|p| [z(p[0], 0), z(p[1], 1)]).collect()
}

/// Lloyd iterations seeded with the first point and the point farthest from it.
fn two_means(points: &[Point], max_iterations: usize) -> (Vec<usize>, [Point; 2]) {
    let first = points[0];
    let mut centroids = [first, points[farthest_from(points, &first)]];
    let mut labels = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (label, point) in labels.iter_mut().zip(points) {
            let nearest = if dist2(point, &centroids[1]) < dist2(point, &centroids[0]) {
                1
            } else {
                0
            };
            if *label != nearest {
                *label = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<Point> = points
                .iter()
                .zip(&labels)
                .filter(|(_, &label)| label == cluster)
                .map(|(point, _)| *point)
                .collect();
            if !members.is_empty() {
                *centroid = mean(&members);
            }
        }
    }

    (labels, centroids)
}

fn mean(points: &[Point]) -> Point {
    let n = points.len().max(1) as f64;
    let mut sum = [0.0; 2];
    for point in points {
        sum[0] += point[0];
        sum[1] += point[1];
    }
    [sum[0] / n, sum[1] / n]
}

fn dist2(a: &Point, b: &Point) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Index of the point farthest from `reference`; the first wins ties.
fn farthest_from(points: &[Point], reference: &Point) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, point) in points.iter().enumerate() {
        let d = dist2(point, reference);
        if d > best {
            best = d;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depot() -> GeoPoint {
        GeoPoint::new(12.9716, 77.5946)
    }

    #[test]
    fn fewer_than_three_points_pick_first_delivery() {
        assert_eq!(find_outlier_position(&[depot()]), 1);
        assert_eq!(
            find_outlier_position(&[depot(), GeoPoint::new(13.0, 77.6)]),
            1
        );
    }

    #[test]
    fn three_points_pick_farthest_from_mean() {
        let coords = [
            depot(),
            GeoPoint::new(12.972, 77.595),
            GeoPoint::new(13.2, 77.9),
        ];
        assert_eq!(find_outlier_position(&coords), 2);
    }

    #[test]
    fn isolated_delivery_forms_the_small_cluster() {
        let advisor = OutlierAdvisor::default();
        let deliveries = vec![
            DeliveryRequest::new(1.0, 12.975, 77.600),
            DeliveryRequest::new(1.0, 13.150, 77.820),
            DeliveryRequest::new(1.0, 12.968, 77.590),
            DeliveryRequest::new(1.0, 12.980, 77.597),
        ];
        assert_eq!(advisor.suggest(depot(), &deliveries).unwrap(), 1);
    }

    #[test]
    fn farthest_member_of_small_cluster_wins() {
        // Two far drops; the farther one from their shared centroid is picked
        let deliveries = vec![
            DeliveryRequest::new(1.0, 12.972, 77.595),
            DeliveryRequest::new(1.0, 12.970, 77.593),
            DeliveryRequest::new(1.0, 12.973, 77.596),
            DeliveryRequest::new(1.0, 13.300, 78.000),
            DeliveryRequest::new(1.0, 13.200, 77.900),
        ];
        let index = OutlierAdvisor::default().suggest(depot(), &deliveries).unwrap();
        assert!(index == 3 || index == 4);
    }

    #[test]
    fn identical_points_report_depot_as_unavailable() {
        let deliveries = vec![
            DeliveryRequest::new(1.0, depot().lat, depot().lon),
            DeliveryRequest::new(1.0, depot().lat, depot().lon),
            DeliveryRequest::new(1.0, depot().lat, depot().lon),
        ];
        let err = OutlierAdvisor::default().suggest(depot(), &deliveries).unwrap_err();
        assert!(matches!(err, AdvisorError::Unavailable(_)));
    }

    #[test]
    fn standardize_handles_constant_axis() {
        let coords = [
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 3.0),
        ];
        let scaled = standardize(&coords);
        assert!(scaled.iter().all(|p| p[0] == 0.0));
        assert!((scaled[0][1] + scaled[2][1]).abs() < 1e-12);
    }
}
