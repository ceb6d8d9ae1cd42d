//! Planning orchestration.
//!
//! One request makes at most four external calls, each a single attempt
//! bounded by its timeout:
//! 1. advisory hint (skipped when the caller supplies one)
//! 2. road geometry for the chosen trip's truck stops and, concurrently,
//!    for the all-truck baseline tour; one without the other is discarded
//! 3. drone-leg time prediction for the chosen launch point
//!
//! Any failure falls back to the local answer. Only invalid input is an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use skyhaul_advisor::{
    AdvisorBackend, AdvisorError, AdvisoryOracle, DirectionsBackend, DirectionsClient,
    DroneLegFeatures, HttpAdvisorClient, PolylineProvider,
};
use skyhaul_core::{
    baseline_waypoints, validate_inputs, DeliveryRequest, Drone, EvaluationOverrides, GeoPoint, PlanError,
    PlanOutcome, SelectionSource, Trip, TripOptimizer,
};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::Config;
use crate::store::{FleetProvider, StoredTrip, TripRepository};

/// A planning request as accepted at the service boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(alias = "hq")]
    pub depot: GeoPoint,
    pub deliveries: Vec<DeliveryRequest>,
    /// Inline fleet; the registered fleet is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet: Option<Vec<Drone>>,
    /// Caller-supplied hint; the advisory oracle is asked when absent
    #[serde(default, alias = "advisoryIndex", skip_serializing_if = "Option::is_none")]
    pub advisory_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSettings {
    pub advisor_timeout: Duration,
    pub directions_timeout: Duration,
    pub leg_prediction_enabled: bool,
    pub wind_speed_mps: f64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            advisor_timeout: config.advisor_timeout(),
            directions_timeout: config.directions_timeout(),
            leg_prediction_enabled: config.leg_prediction_enabled,
            wind_speed_mps: config.wind_speed_mps,
        }
    }
}

pub struct PlanningService<O = AdvisorBackend, P = DirectionsBackend> {
    optimizer: TripOptimizer,
    oracle: O,
    directions: P,
    settings: ServiceSettings,
    fleet: Arc<dyn FleetProvider>,
    trips: Arc<dyn TripRepository>,
}

impl PlanningService<AdvisorBackend, DirectionsBackend> {
    /// Wire the HTTP advisor and directions clients from configuration.
    pub fn from_config(
        config: &Config,
        fleet: Arc<dyn FleetProvider>,
        trips: Arc<dyn TripRepository>,
    ) -> anyhow::Result<Self> {
        let oracle = if config.advisor_enabled {
            let client = HttpAdvisorClient::new(config.advisor_url.trim(), config.advisor_timeout())
                .context("building advisory client")?;
            AdvisorBackend::Http(client)
        } else {
            AdvisorBackend::Disabled
        };

        let directions = if config.directions_enabled() {
            let client = DirectionsClient::new(config.directions_url.trim(), config.directions_timeout())
                .context("building directions client")?;
            DirectionsBackend::Osrm(client)
        } else {
            DirectionsBackend::Disabled
        };

        tracing::info!(
            advisor = oracle.name(),
            directions = config.directions_enabled(),
            leg_prediction = config.leg_prediction_enabled,
            "Planning service configured"
        );

        Ok(Self::new(
            TripOptimizer::new(config.planning_rules()),
            oracle,
            directions,
            ServiceSettings::from(config),
            fleet,
            trips,
        ))
    }
}

impl<O, P> PlanningService<O, P>
where
    O: AdvisoryOracle,
    P: PolylineProvider,
{
    pub fn new(
        optimizer: TripOptimizer,
        oracle: O,
        directions: P,
        settings: ServiceSettings,
        fleet: Arc<dyn FleetProvider>,
        trips: Arc<dyn TripRepository>,
    ) -> Self {
        Self {
            optimizer,
            oracle,
            directions,
            settings,
            fleet,
            trips,
        }
    }

    /// Swap the advisory oracle, keeping everything else.
    pub fn with_oracle<Q: AdvisoryOracle>(self, oracle: Q) -> PlanningService<Q, P> {
        PlanningService {
            optimizer: self.optimizer,
            oracle,
            directions: self.directions,
            settings: self.settings,
            fleet: self.fleet,
            trips: self.trips,
        }
    }

    pub fn optimizer(&self) -> &TripOptimizer {
        &self.optimizer
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn fleet(&self) -> &Arc<dyn FleetProvider> {
        &self.fleet
    }

    /// Plan a trip, consulting external collaborators where available.
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        let fleet = match &request.fleet {
            Some(inline) => inline.clone(),
            None => self.fleet.snapshot(),
        };
        let depot = request.depot;
        let deliveries = request.deliveries.as_slice();

        // Reject bad input before spending any network round-trips on it
        validate_inputs(&depot, deliveries, &fleet, self.optimizer.rules())?;

        let hint = match request.advisory_index {
            Some(index) => Some(index),
            None => self.advisory_hint(depot, deliveries).await,
        };

        let mut trip = match self.optimizer.plan(depot, deliveries, &fleet, hint)? {
            PlanOutcome::Planned(trip) => trip,
            PlanOutcome::Infeasible => {
                tracing::info!(
                    deliveries = deliveries.len(),
                    drones = fleet.len(),
                    "No eligible drone for any delivery"
                );
                return Ok(PlanOutcome::Infeasible);
            }
        };

        if let Some(index) = hint {
            if matches!(trip.selection, SelectionSource::Enumerated { .. }) {
                tracing::warn!(
                    index,
                    deliveries = deliveries.len(),
                    "Advisory hint rejected; evaluated every candidate"
                );
            }
        }

        let road = self.road_geometry(&trip, depot, deliveries).await;
        if let Some(road) = &road {
            trip = self.refined(trip, deliveries, &fleet, &road.overrides(None))?;
        }

        if let Some(minutes) = self.predicted_leg_minutes(&trip, &fleet).await {
            let overrides = match &road {
                Some(road) => road.overrides(Some(minutes)),
                None => EvaluationOverrides {
                    drone_leg_minutes: Some(minutes),
                    ..EvaluationOverrides::default()
                },
            };
            trip = self.refined(trip, deliveries, &fleet, &overrides)?;
        }

        tracing::info!(
            drone_delivery_index = trip.drone_delivery_index,
            drone_id = %trip.assigned_drone.drone_id,
            carbon_reduction_percent = trip.carbon_reduction_percent,
            selection = ?trip.selection,
            polyline = ?trip.polyline_source,
            drone_time = ?trip.drone_time_source,
            "Trip planned"
        );
        Ok(PlanOutcome::Planned(trip))
    }

    /// Persist a planned trip and take its drone out of service.
    pub fn commit(&self, trip: Trip) -> StoredTrip {
        let drone_id = trip.assigned_drone.drone_id.clone();
        let battery = trip.assigned_drone.current_battery_percent;
        if !self.fleet.mark_dispatched(&drone_id, battery) {
            tracing::warn!(drone_id = %drone_id, "Committed trip uses a drone outside the registered fleet");
        }

        let stored = self.trips.save(trip);
        tracing::info!(trip_id = %stored.trip_id, drone_id = %drone_id, "Trip committed");
        stored
    }

    pub fn trip(&self, trip_id: &Uuid) -> Option<StoredTrip> {
        self.trips.get(trip_id)
    }

    /// Committed trips, newest first.
    pub fn trip_history(&self) -> Vec<StoredTrip> {
        self.trips.list()
    }

    async fn advisory_hint(&self, depot: GeoPoint, deliveries: &[DeliveryRequest]) -> Option<usize> {
        let call = self.oracle.suggest_drone_index(depot, deliveries);
        let index = bounded("advisory hint", self.settings.advisor_timeout, call).await?;
        tracing::debug!(index, "Advisory hint received");
        Some(index)
    }

    /// Road geometry for the trip and for the all-truck baseline, or neither,
    /// so savings never compare a road distance against a straight line.
    async fn road_geometry(
        &self,
        trip: &Trip,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
    ) -> Option<RoadGeometry> {
        let truck_waypoints = trip.truck_waypoints();
        let baseline_waypoints = baseline_waypoints(depot, deliveries);
        let (truck, baseline) = tokio::join!(
            self.road_polyline(&truck_waypoints),
            self.road_polyline(&baseline_waypoints),
        );
        match (truck, baseline) {
            (Some(truck), Some(baseline)) => Some(RoadGeometry { truck, baseline }),
            (Some(_), None) => {
                tracing::debug!("Baseline road geometry missing; keeping straight-line distances");
                None
            }
            _ => None,
        }
    }

    async fn road_polyline(&self, waypoints: &[GeoPoint]) -> Option<Vec<GeoPoint>> {
        let call = self.directions.fetch_polyline(waypoints);
        bounded("road polyline", self.settings.directions_timeout, call).await
    }

    async fn predicted_leg_minutes(&self, trip: &Trip, fleet: &[Drone]) -> Option<f64> {
        if !self.settings.leg_prediction_enabled {
            return None;
        }
        let features = DroneLegFeatures::for_leg(
            &trip.drone_delivery,
            trip.drone_round_trip_km,
            self.settings.wind_speed_mps,
        );
        let call = self.oracle.predict_drone_leg_minutes(&features, fleet);
        bounded("drone leg prediction", self.settings.advisor_timeout, call).await
    }

    fn refined(
        &self,
        trip: Trip,
        deliveries: &[DeliveryRequest],
        fleet: &[Drone],
        overrides: &EvaluationOverrides<'_>,
    ) -> Result<Trip, PlanError> {
        match self.optimizer.refine(&trip, deliveries, fleet, overrides)? {
            PlanOutcome::Planned(refined) => Ok(refined),
            PlanOutcome::Infeasible => Ok(trip),
        }
    }
}

struct RoadGeometry {
    truck: Vec<GeoPoint>,
    baseline: Vec<GeoPoint>,
}

impl RoadGeometry {
    fn overrides(&self, drone_leg_minutes: Option<f64>) -> EvaluationOverrides<'_> {
        EvaluationOverrides {
            polyline: Some(&self.truck),
            baseline_polyline: Some(&self.baseline),
            drone_leg_minutes,
        }
    }
}

/// Await one external call within `limit`. Failures are logged and become `None`.
async fn bounded<T>(
    call_name: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, AdvisorError>>,
) -> Option<T> {
    match timeout(limit, call).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(AdvisorError::Unavailable(reason))) => {
            tracing::debug!(call = call_name, reason = %reason, "External call skipped; using local fallback");
            None
        }
        Ok(Err(err)) => {
            tracing::warn!(call = call_name, kind = err.kind(), error = %err, "External call failed; using local fallback");
            None
        }
        Err(_) => {
            tracing::warn!(
                call = call_name,
                timeout_ms = limit.as_millis() as u64,
                "External call timed out; using local fallback"
            );
            None
        }
    }
}
