//! CLI entry point for the fleet monitor.
//!
//! Provides subcommands for taking one classified fleet snapshot, watching
//! the fleet at an interval, and inspecting a single vehicle.

mod infra;
mod services;

use crate::infra::fleet::client::FleetApiClient;
use crate::services::fleet_api::FleetApi;
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use fleet_monitor::classifier::documents::{build_registry, DocumentRegistry};
use fleet_monitor::classifier::snapshot::{
    annotate, attach_telemetry, classify, filter_by_place, FleetSnapshot, VehicleRow,
};
use fleet_monitor::fetch::batch::MergePolicy;
use fleet_monitor::fetch::{fetch_json, BasicClient};
use fleet_monitor::model::{DocumentRecord, Remark, TripsByVehicle, Vehicle};
use fleet_monitor::output::{
    append_stats, build_report, export_vehicles, print_json, StatsRecord,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_monitor")]
#[command(about = "A tool to classify and monitor fleet vehicle state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one fleet snapshot, classify it, and write the results
    Snapshot {
        /// Vehicle group to fetch (e.g. LINE_17FEET)
        #[arg(short, long)]
        group: String,

        /// Path or URL of the vehicle document registry JSON
        #[arg(short, long, default_value = "vehicle_documents.json")]
        documents: String,

        /// CSV file to write the raw fleet export to
        #[arg(short, long, default_value = "fleet.csv")]
        output: String,

        /// Print the annotated snapshot as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Only keep vehicles whose resolved place contains this text
        #[arg(long)]
        place: Option<String>,

        /// Maximum number of concurrent batch requests
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,

        /// Fail the whole snapshot if any batch chunk fails, instead of
        /// merging the successful chunks
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Periodically re-fetch the fleet and append per-status counts to a CSV
    Watch {
        /// Vehicle group to fetch
        #[arg(short, long)]
        group: String,

        /// CSV file to append stats rows to
        #[arg(short, long, default_value = "fleet_stats.csv")]
        output: String,

        /// Sample rate: query the fleet every X seconds
        #[arg(short = 'r', long, default_value_t = 60)]
        sample_rate: u64,

        /// Number of samples to collect (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 1)]
        num_samples: usize,

        /// Maximum number of concurrent batch requests
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,
    },
    /// Show the annotated row and latest remark for a single vehicle
    Inspect {
        /// Vehicle number to look up
        #[arg(value_name = "VEHICLE_NUMBER")]
        vehicle_number: String,

        /// Vehicle group the vehicle belongs to
        #[arg(short, long)]
        group: String,

        /// Path or URL of the vehicle document registry JSON
        #[arg(short, long, default_value = "vehicle_documents.json")]
        documents: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fleet_monitor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let base_url =
        std::env::var("FLEET_API_BASE_URL").expect("FLEET_API_BASE_URL must be set");

    match cli.command {
        Commands::Snapshot {
            group,
            documents,
            output,
            json,
            place,
            concurrency,
            strict,
        } => {
            let mut api = FleetApiClient::new(base_url, concurrency)?;
            if strict {
                api = api.with_merge_policy(MergePolicy::Strict);
            }
            let registry = load_documents(&documents).await?;

            let (vehicles, trips) = fetch_fleet(&api, &group).await?;
            let vehicles = match place.as_deref() {
                Some(query) => filter_by_place(&vehicles, &trips, query),
                None => vehicles,
            };

            let snapshot = classify(&vehicles, &trips);
            log_snapshot(&group, &snapshot);

            export_vehicles(&output, &vehicles)?;
            info!(output = %output, "Fleet CSV export written");

            if json {
                let report = build_report(&snapshot, &trips, &registry, Utc::now());
                print_json(&report)?;
            }
        }
        Commands::Watch {
            group,
            output,
            sample_rate,
            num_samples,
            concurrency,
        } => {
            let api = FleetApiClient::new(base_url, concurrency)?;
            watch_fleet(&api, &group, &output, sample_rate, num_samples).await?;
        }
        Commands::Inspect {
            vehicle_number,
            group,
            documents,
        } => {
            let api = FleetApiClient::new(base_url, 1)?;
            let registry = load_documents(&documents).await?;
            inspect_vehicle(&api, &group, &vehicle_number, &registry).await?;
        }
    }

    Ok(())
}

/// Loads the document registry from a local file path or over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn load_documents(source: &str) -> Result<DocumentRegistry> {
    let records: Vec<DocumentRecord> = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_json(&client, source).await?
    } else {
        serde_json::from_slice(&std::fs::read(source)?)?
    };

    info!(record_count = records.len(), "Document registry loaded");
    Ok(build_registry(records))
}

/// Fetches the vehicle listing, fans out the chunked waypoint and trip
/// batches, joins them, and merges the telemetry into the vehicle set.
#[tracing::instrument(skip(api), fields(group))]
async fn fetch_fleet(
    api: &FleetApiClient,
    group: &str,
) -> Result<(Vec<Vehicle>, TripsByVehicle)> {
    let vehicles = api.list_vehicles(group).await?;
    info!(vehicle_count = vehicles.len(), "Vehicle listing fetched");

    let numbers: Vec<String> = vehicles.iter().map(|v| v.vehicle_number.clone()).collect();
    let (waypoints, trips) =
        tokio::join!(api.waypoints_batch(&numbers), api.trips_batch(&numbers));
    let waypoints = waypoints?;
    let trips = trips?;

    info!(
        waypoint_count = waypoints.len(),
        trip_histories = trips.len(),
        "Batch telemetry fetched"
    );

    let vehicles = attach_telemetry(vehicles, &waypoints, &trips);
    Ok((vehicles, trips))
}

fn log_snapshot(group: &str, snapshot: &FleetSnapshot) {
    let stats = &snapshot.stats;
    info!(
        group,
        total = stats.total,
        available = stats.available,
        in_transit = stats.in_transit,
        at_unloading = stats.at_unloading,
        empty_movement = stats.empty_movement,
        off_duty = stats.off_duty,
        at_pickup = stats.at_pickup,
        enroute_for_pickup = stats.enroute_for_pickup,
        maintenance = stats.maintenance,
        branches = snapshot.branches.len(),
        "Fleet classified"
    );

    if stats.unrecognized > 0 {
        warn!(
            unrecognized = stats.unrecognized,
            "Vehicles with unrecognized status excluded from all buckets"
        );
    }
}

/// Re-fetches the fleet at a fixed interval, appending one stats row per
/// sample. A failed sample is logged and skipped; the loop keeps going.
#[tracing::instrument(skip(api), fields(group, output, sample_rate, num_samples))]
async fn watch_fleet(
    api: &FleetApiClient,
    group: &str,
    output: &str,
    sample_rate: u64,
    num_samples: usize,
) -> Result<()> {
    if num_samples == 0 {
        info!(sample_rate, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, sample_rate, "Starting sample collection");
    }

    let mut sample_count = 0;

    loop {
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }

        sample_count += 1;
        info!(sample = sample_count, "Starting sample round");

        match fetch_fleet(api, group).await {
            Ok((vehicles, trips)) => {
                let snapshot = classify(&vehicles, &trips);
                log_snapshot(group, &snapshot);

                let record = StatsRecord::new(Utc::now(), &snapshot.stats);
                if let Err(e) = append_stats(output, &record) {
                    error!(error = %e, "Failed to append stats row");
                }
            }
            Err(e) => {
                error!(error = %e, "Fleet fetch failed, skipping sample");
            }
        }

        if num_samples == 0 || sample_count < num_samples {
            info!(sample_rate, "Waiting before next sample");
            tokio::time::sleep(tokio::time::Duration::from_secs(sample_rate)).await;
        }
    }

    info!(output, "Finished sampling");
    Ok(())
}

#[derive(Serialize)]
struct InspectReport {
    row: VehicleRow,
    remark: Option<Remark>,
}

/// Fetches a single vehicle's annotated row plus its latest remark.
#[tracing::instrument(skip(api, registry), fields(group, vehicle_number))]
async fn inspect_vehicle(
    api: &FleetApiClient,
    group: &str,
    vehicle_number: &str,
    registry: &DocumentRegistry,
) -> Result<()> {
    let vehicles = api.list_vehicles(group).await?;
    let Some(vehicle) = vehicles
        .iter()
        .find(|v| v.vehicle_number == vehicle_number)
        .cloned()
    else {
        anyhow::bail!("Vehicle {} not found in group {}", vehicle_number, group);
    };

    let numbers = vec![vehicle.vehicle_number.clone()];
    let (waypoints, trips) =
        tokio::join!(api.waypoints_batch(&numbers), api.trips_batch(&numbers));
    let waypoints = waypoints?;
    let trips = trips?;

    let mut merged = attach_telemetry(vec![vehicle], &waypoints, &trips);
    let vehicle = merged.remove(0);

    let remark = match api.latest_remark(&vehicle.id).await {
        Ok(remark) => remark,
        Err(e) => {
            warn!(error = %e, "Remark lookup failed");
            None
        }
    };

    let row = annotate(&vehicle, &trips, registry, Utc::now());
    print_json(&InspectReport { row, remark })?;

    Ok(())
}
