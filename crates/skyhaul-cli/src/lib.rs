//! skyhaul CLI - command line tools for hybrid truck + drone trip planning.
//!
//! Binaries:
//! - plan_trip: plan (and optionally commit) a trip from a JSON request

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use skyhaul_advisor::{AdvisorBackend, OutlierAdvisor};
use skyhaul_core::{km_to_miles, Drone, PlanOutcome, Trip};
use skyhaul_service::{Config, InMemoryFleet, InMemoryTripRepository, PlanRequest, PlanningService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Where advisory hints come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdvisorChoice {
    /// Remote prediction service
    Http,
    /// In-process outlier detection
    Local,
    /// No hints; always enumerate
    Off,
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays JSON.
pub fn init_tracing(json_logs: bool) -> Result<()> {
    let filter = || -> Result<tracing_subscriber::EnvFilter> {
        Ok(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("skyhaul_service=info".parse()?)
            .add_directive("skyhaul_advisor=info".parse()?))
    };

    if json_logs {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(filter()?)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter()?)
            .try_init()?;
    }
    Ok(())
}

/// Read a JSON document from a file, or stdin when `path` is `-`.
fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading request from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn load_request(path: &Path) -> Result<PlanRequest> {
    let raw = read_source(path)?;
    parse_request(&raw).with_context(|| format!("parsing request {}", path.display()))
}

pub fn parse_request(raw: &str) -> Result<PlanRequest> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_fleet(path: &Path) -> Result<Vec<Drone>> {
    let raw = read_source(path)?;
    serde_json::from_str(&raw).with_context(|| format!("parsing fleet {}", path.display()))
}

/// Build the planning service for the chosen advisor.
pub fn build_service(
    config: &Config,
    advisor: AdvisorChoice,
    fleet: Vec<Drone>,
) -> Result<PlanningService> {
    let mut config = config.clone();
    config.advisor_enabled = advisor == AdvisorChoice::Http;

    let service = PlanningService::from_config(
        &config,
        Arc::new(InMemoryFleet::with_drones(fleet)),
        Arc::new(InMemoryTripRepository::new()),
    )?;

    Ok(match advisor {
        AdvisorChoice::Local => service.with_oracle(AdvisorBackend::Local(OutlierAdvisor::default())),
        AdvisorChoice::Http | AdvisorChoice::Off => service,
    })
}

pub fn render<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// One-line human summary for stderr.
pub fn summary(outcome: &PlanOutcome) -> String {
    match outcome {
        PlanOutcome::Planned(trip) => trip_summary(trip),
        PlanOutcome::Infeasible => {
            "No eligible drone for any delivery; all deliveries stay on the truck".to_string()
        }
    }
}

fn trip_summary(trip: &Trip) -> String {
    format!(
        "Delivery {} by drone {} | truck {:.2} mi, drone {:.2} mi | CO2 {:.2} kg vs {:.2} kg ({:.1}% less) | {:.0} min",
        trip.drone_delivery_index,
        trip.assigned_drone.drone_id,
        km_to_miles(trip.truck_route_km),
        km_to_miles(trip.drone_round_trip_km),
        trip.total_carbon_kg,
        trip.baseline_carbon_kg,
        trip.carbon_reduction_percent,
        trip.total_trip_time_minutes,
    )
}
