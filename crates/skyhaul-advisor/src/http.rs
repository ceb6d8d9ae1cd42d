//! HTTP client for the advisory prediction service.
//!
//! Endpoints:
//! - `POST /find_outlier` `{"coordinates": [{"lat", "lon"}, ...]}` with the
//!   depot first, answering `{"outlier_index"}` into that list
//! - `POST /predict_time` `{"features": {...}, "drones": [...]}` answering
//!   `{"predicted_time_minutes"}` and/or `{"predicted_time_seconds"}`

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use skyhaul_core::{DeliveryRequest, Drone, GeoPoint};

use crate::error::AdvisorError;
use crate::features::{DroneLegFeatures, DroneSummary};
use crate::oracle::AdvisoryOracle;

#[derive(Debug, Clone)]
pub struct HttpAdvisorClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct Coordinate {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct OutlierRequest {
    coordinates: Vec<Coordinate>,
}

#[derive(Debug, Deserialize)]
struct OutlierResponse {
    outlier_index: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a DroneLegFeatures,
    drones: Vec<DroneSummary>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predicted_time_minutes: Option<f64>,
    predicted_time_seconds: Option<f64>,
}

impl HttpAdvisorClient {
    /// Client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AdvisorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, R>(&self, service: &'static str, path: &str, body: &B) -> Result<R, AdvisorError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| AdvisorError::InvalidResponse(format!("{service}: {e}")))
    }
}

impl AdvisoryOracle for HttpAdvisorClient {
    async fn suggest_drone_index(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> Result<usize, AdvisorError> {
        let request = OutlierRequest {
            coordinates: std::iter::once(depot)
                .chain(deliveries.iter().map(DeliveryRequest::location))
                .map(|p| Coordinate { lat: p.lat, lon: p.lon })
                .collect(),
        };

        let response: OutlierResponse = self.post_json("find_outlier", "/find_outlier", &request).await?;
        let index = delivery_index_from_outlier(response.outlier_index, deliveries.len())?;
        tracing::debug!(index, url = %self.base_url, "Advisory outlier index received");
        Ok(index)
    }

    async fn predict_drone_leg_minutes(
        &self,
        features: &DroneLegFeatures,
        fleet: &[Drone],
    ) -> Result<f64, AdvisorError> {
        let request = PredictRequest {
            features,
            drones: fleet.iter().map(DroneSummary::from).collect(),
        };

        let response: PredictResponse = self.post_json("predict_time", "/predict_time", &request).await?;
        let minutes = minutes_from_prediction(&response)?;
        tracing::debug!(minutes, url = %self.base_url, "Drone leg time predicted");
        Ok(minutes)
    }
}

/// Convert a depot-first outlier position into a delivery index.
fn delivery_index_from_outlier(
    raw: Option<serde_json::Value>,
    deliveries: usize,
) -> Result<usize, AdvisorError> {
    let raw = raw.ok_or_else(|| AdvisorError::InvalidResponse("missing outlier_index".to_string()))?;
    let position = raw
        .as_i64()
        .or_else(|| raw.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
        .ok_or_else(|| AdvisorError::InvalidResponse(format!("outlier_index is not an integer: {raw}")))?;

    let index = position - 1;
    if index < 0 || index as usize >= deliveries {
        return Err(AdvisorError::IndexOutOfRange {
            index,
            len: deliveries,
        });
    }
    Ok(index as usize)
}

fn minutes_from_prediction(response: &PredictResponse) -> Result<f64, AdvisorError> {
    let minutes = response
        .predicted_time_minutes
        .or_else(|| response.predicted_time_seconds.map(|s| s / 60.0))
        .ok_or_else(|| AdvisorError::InvalidResponse("no predicted time in response".to_string()))?;

    if !minutes.is_finite() || minutes < 0.0 {
        return Err(AdvisorError::InvalidResponse(format!(
            "predicted time must be a non-negative number, got {minutes}"
        )));
    }
    Ok(minutes)
}
