//! Road geometry for the truck tour.
//!
//! [`DirectionsClient`] speaks the OSRM route API:
//! `GET {base}/route/v1/driving/{lon,lat;...}?overview=full&geometries=geojson`
//! and reads `routes[0].geometry.coordinates` as `[lon, lat]` pairs.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use skyhaul_core::GeoPoint;

use crate::error::AdvisorError;

/// Source of a road-following polyline through ordered waypoints.
pub trait PolylineProvider {
    fn fetch_polyline(
        &self,
        waypoints: &[GeoPoint],
    ) -> impl Future<Output = Result<Vec<GeoPoint>, AdvisorError>> + Send;
}

/// Directions source chosen at runtime from configuration.
#[derive(Debug, Clone, Default)]
pub enum DirectionsBackend {
    Osrm(DirectionsClient),
    #[default]
    Disabled,
}

impl PolylineProvider for DirectionsBackend {
    async fn fetch_polyline(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, AdvisorError> {
        match self {
            DirectionsBackend::Osrm(client) => client.fetch_polyline(waypoints).await,
            DirectionsBackend::Disabled => Err(AdvisorError::Unavailable(
                "no directions service configured".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    client: Client,
    base_url: String,
    profile: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<Vec<f64>>,
}

impl DirectionsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AdvisorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: "driving".to_string(),
        }
    }

    /// Routing profile segment of the URL (`driving` by default).
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    fn route_url(&self, waypoints: &[GeoPoint]) -> String {
        let coords = waypoints
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url, self.profile, coords
        )
    }
}

impl PolylineProvider for DirectionsClient {
    async fn fetch_polyline(&self, waypoints: &[GeoPoint]) -> Result<Vec<GeoPoint>, AdvisorError> {
        if waypoints.len() < 2 {
            return Err(AdvisorError::InvalidResponse(format!(
                "route needs at least two waypoints, got {}",
                waypoints.len()
            )));
        }

        let url = self.route_url(waypoints);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                service: "directions",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RouteResponse = response.json().await?;
        let polyline = polyline_from_route(parsed)?;
        tracing::debug!(
            waypoints = waypoints.len(),
            points = polyline.len(),
            "Road polyline fetched"
        );
        Ok(polyline)
    }
}

fn polyline_from_route(response: RouteResponse) -> Result<Vec<GeoPoint>, AdvisorError> {
    if let Some(code) = response.code.as_deref() {
        if !code.eq_ignore_ascii_case("ok") {
            return Err(AdvisorError::InvalidResponse(format!(
                "directions code {code}: {}",
                response.message.unwrap_or_default()
            )));
        }
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| AdvisorError::InvalidResponse("no routes in response".to_string()))?;

    let points = route
        .geometry
        .coordinates
        .iter()
        .map(|pair| match pair.as_slice() {
            [lon, lat, ..] => Ok(GeoPoint::new(*lat, *lon)),
            _ => Err(AdvisorError::InvalidResponse(format!(
                "coordinate has {} values",
                pair.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.len() < 2 || !points.iter().all(GeoPoint::is_valid) {
        return Err(AdvisorError::InvalidResponse(
            "route geometry is degenerate".to_string(),
        ));
    }
    Ok(points)
}
