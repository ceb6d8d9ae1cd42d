//! The advisory oracle seam.

use std::future::Future;

use skyhaul_core::{DeliveryRequest, Drone, GeoPoint};

use crate::error::AdvisorError;
use crate::features::DroneLegFeatures;
use crate::http::HttpAdvisorClient;
use crate::outlier::OutlierAdvisor;

/// Best-effort advice for the trip optimizer.
///
/// Answers are hints. The optimizer re-validates a suggested index and
/// falls back to full enumeration when it is unusable.
pub trait AdvisoryOracle {
    /// Index into `deliveries` of the delivery best served by drone.
    fn suggest_drone_index(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> impl Future<Output = Result<usize, AdvisorError>> + Send;

    /// Predicted minutes for a whole drone leg.
    fn predict_drone_leg_minutes(
        &self,
        features: &DroneLegFeatures,
        fleet: &[Drone],
    ) -> impl Future<Output = Result<f64, AdvisorError>> + Send;
}

/// Oracle chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AdvisorBackend {
    Http(HttpAdvisorClient),
    Local(OutlierAdvisor),
    Disabled,
}

impl AdvisorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            AdvisorBackend::Http(_) => "http",
            AdvisorBackend::Local(_) => "local",
            AdvisorBackend::Disabled => "disabled",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, AdvisorBackend::Disabled)
    }
}

impl AdvisoryOracle for AdvisorBackend {
    async fn suggest_drone_index(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> Result<usize, AdvisorError> {
        match self {
            AdvisorBackend::Http(client) => client.suggest_drone_index(depot, deliveries).await,
            AdvisorBackend::Local(local) => local.suggest_drone_index(depot, deliveries).await,
            AdvisorBackend::Disabled => {
                Err(AdvisorError::Unavailable("advisor disabled".to_string()))
            }
        }
    }

    async fn predict_drone_leg_minutes(
        &self,
        features: &DroneLegFeatures,
        fleet: &[Drone],
    ) -> Result<f64, AdvisorError> {
        match self {
            AdvisorBackend::Http(client) => client.predict_drone_leg_minutes(features, fleet).await,
            AdvisorBackend::Local(local) => local.predict_drone_leg_minutes(features, fleet).await,
            AdvisorBackend::Disabled => {
                Err(AdvisorError::Unavailable("advisor disabled".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_backend_is_unavailable() {
        let backend = AdvisorBackend::Disabled;
        let err = backend
            .suggest_drone_index(GeoPoint::new(0.0, 0.0), &[DeliveryRequest::new(1.0, 0.0, 0.1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::Unavailable(_)));
        assert!(!backend.is_enabled());
    }

    #[tokio::test]
    async fn local_backend_delegates() {
        let backend = AdvisorBackend::Local(OutlierAdvisor::default());
        let deliveries = vec![
            DeliveryRequest::new(1.0, 0.0, 0.01),
            DeliveryRequest::new(1.0, 0.0, 0.02),
            DeliveryRequest::new(1.0, 0.01, 0.01),
            DeliveryRequest::new(1.0, 0.5, 0.5),
        ];
        let index = backend
            .suggest_drone_index(GeoPoint::new(0.0, 0.0), &deliveries)
            .await
            .unwrap();
        assert_eq!(index, 3);
        assert_eq!(backend.name(), "local");
    }
}
