use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use skyhaul_cli::{build_service, init_tracing, load_fleet, load_request, render, summary, AdvisorChoice};
use skyhaul_core::PlanOutcome;
use skyhaul_service::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a hybrid truck + drone trip", long_about = None)]
struct Args {
    /// Planning request JSON (`-` reads stdin)
    request: PathBuf,

    /// Fleet JSON (array of drones) registered before planning
    #[arg(long)]
    fleet: Option<PathBuf>,

    /// Advisory hint source
    #[arg(long, value_enum, default_value_t = AdvisorChoice::Http)]
    advisor: AdvisorChoice,

    /// Advisory service URL (overrides SKYHAUL_ADVISOR_URL)
    #[arg(long)]
    advisor_url: Option<String>,

    /// OSRM directions URL (overrides SKYHAUL_DIRECTIONS_URL)
    #[arg(long)]
    directions_url: Option<String>,

    /// Drone delivery index to try first
    #[arg(long)]
    hint: Option<usize>,

    /// Skip the drone-leg time prediction
    #[arg(long)]
    no_leg_prediction: bool,

    /// Store the planned trip and mark its drone dispatched
    #[arg(long)]
    commit: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let mut config = Config::from_env();
    if let Some(url) = args.advisor_url {
        config.advisor_url = url;
    }
    if let Some(url) = args.directions_url {
        config.directions_url = url;
    }
    if args.no_leg_prediction {
        config.leg_prediction_enabled = false;
    }

    let mut request = load_request(&args.request)?;
    if args.hint.is_some() {
        request.advisory_index = args.hint;
    }
    let fleet = match &args.fleet {
        Some(path) => load_fleet(path)?,
        None => Vec::new(),
    };

    let service = build_service(&config, args.advisor, fleet)?;
    let outcome = service.plan(&request).await?;
    eprintln!("{}", summary(&outcome));

    match outcome {
        PlanOutcome::Planned(trip) if args.commit => {
            let stored = service.commit(trip);
            println!("{}", render(&stored, args.pretty)?);
        }
        other => println!("{}", render(&other, args.pretty)?),
    }

    Ok(())
}
