//! Output formatting and persistence for fleet snapshots.
//!
//! Supports the raw-fleet CSV export, a per-sample stats append for watch
//! mode, and the annotated JSON report handed to downstream consumers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::classifier::documents::DocumentRegistry;
use crate::classifier::snapshot::{
    annotate_bucket, BranchAvailability, FleetSnapshot, FleetStats, VehicleRow,
};
use crate::model::{TripStatus, TripsByVehicle, Vehicle};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One row of the raw fleet export.
#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Vehicle Number")]
    vehicle_number: &'a str,
    #[serde(rename = "Type")]
    vehicle_type: &'a str,
    #[serde(rename = "Status")]
    status: TripStatus,
    #[serde(rename = "Last Updated")]
    last_updated: String,
    #[serde(rename = "Halt Hrs")]
    halt_hours: String,
}

/// Writes the raw vehicle set as CSV, replacing any existing file.
///
/// Zero or missing halting hours export as `N/A`.
pub fn export_vehicles(path: &str, vehicles: &[Vehicle]) -> Result<()> {
    debug!(path, count = vehicles.len(), "Writing fleet CSV export");

    let mut writer = csv::Writer::from_path(path)?;

    for vehicle in vehicles {
        let halt_hours = match vehicle.halting_hours {
            Some(hours) if hours > 0.0 => hours.to_string(),
            _ => "N/A".to_string(),
        };

        writer.serialize(ExportRow {
            vehicle_number: &vehicle.vehicle_number,
            vehicle_type: &vehicle.vehicle_type,
            status: vehicle.current_trip_status,
            last_updated: vehicle.updated_at.to_rfc3339(),
            halt_hours,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// One watch-mode sample: per-status counts at a point in time.
#[derive(Debug, Serialize)]
pub struct StatsRecord {
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub available: usize,
    pub in_transit: usize,
    pub at_unloading: usize,
    pub empty_movement: usize,
    pub off_duty: usize,
    pub at_pickup: usize,
    pub enroute_for_pickup: usize,
    pub maintenance: usize,
    pub unrecognized: usize,
}

impl StatsRecord {
    pub fn new(timestamp: DateTime<Utc>, stats: &FleetStats) -> Self {
        StatsRecord {
            timestamp,
            total: stats.total,
            available: stats.available,
            in_transit: stats.in_transit,
            at_unloading: stats.at_unloading,
            empty_movement: stats.empty_movement,
            off_duty: stats.off_duty,
            at_pickup: stats.at_pickup,
            enroute_for_pickup: stats.enroute_for_pickup,
            maintenance: stats.maintenance,
            unrecognized: stats.unrecognized,
        }
    }
}

/// Appends a [`StatsRecord`] row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_stats(path: &str, record: &StatsRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending stats record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

/// One annotated bucket in the JSON report.
#[derive(Debug, Serialize)]
pub struct BucketReport {
    pub status: TripStatus,
    pub title: &'static str,
    pub count: usize,
    pub vehicles: Vec<VehicleRow>,
}

/// The full annotated snapshot handed to tables, charts, and exports.
#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    pub taken_at: DateTime<Utc>,
    pub stats: FleetStats,
    pub buckets: Vec<BucketReport>,
    pub branches: Vec<BranchAvailability>,
}

/// Annotates every bucket of a classified snapshot into a [`SnapshotReport`].
pub fn build_report(
    snapshot: &FleetSnapshot,
    trips: &TripsByVehicle,
    registry: &DocumentRegistry,
    now: DateTime<Utc>,
) -> SnapshotReport {
    let buckets = snapshot
        .buckets
        .iter()
        .map(|(status, bucket)| BucketReport {
            status,
            title: status.title(),
            count: bucket.len(),
            vehicles: annotate_bucket(bucket, trips, registry, now),
        })
        .collect();

    SnapshotReport {
        taken_at: now,
        stats: snapshot.stats.clone(),
        buckets,
        branches: snapshot.branches.clone(),
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::snapshot::classify;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn vehicle(number: &str, status: TripStatus, halt_hours: Option<f64>) -> Vehicle {
        Vehicle {
            id: format!("id-{number}"),
            vehicle_number: number.to_string(),
            vehicle_type: "17-feet".to_string(),
            current_trip_status: status,
            current_trip_id: None,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2025-06-01T00:00:00Z".parse().unwrap(),
            halting_hours: halt_hours,
            waypoint: None,
        }
    }

    fn sample_stats() -> StatsRecord {
        StatsRecord::new(
            "2025-06-01T12:00:00Z".parse().unwrap(),
            &FleetStats::default(),
        )
    }

    #[test]
    fn test_export_vehicles_writes_sentinel_for_zero_hours() {
        let path = temp_path("fleet_monitor_test_export.csv");
        let _ = fs::remove_file(&path);

        let vehicles = vec![
            vehicle("MH12AB1234", TripStatus::Available, Some(0.0)),
            vehicle("MH12CD5678", TripStatus::InTransit, Some(5.5)),
            vehicle("MH12EF9012", TripStatus::OffDuty, None),
        ];
        export_vehicles(&path, &vehicles).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Vehicle Number,Type,Status,Last Updated,Halt Hrs");
        assert!(lines[1].ends_with("N/A"));
        assert!(lines[2].ends_with("5.5"));
        assert!(lines[3].ends_with("N/A"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_stats_creates_file() {
        let path = temp_path("fleet_monitor_test_create.csv");
        let _ = fs::remove_file(&path);

        append_stats(&path, &sample_stats()).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_stats_writes_header_once() {
        let path = temp_path("fleet_monitor_test_header.csv");
        let _ = fs::remove_file(&path);

        append_stats(&path, &sample_stats()).unwrap();
        append_stats(&path, &sample_stats()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);

        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_build_report_keeps_display_order() {
        let fleet = vec![
            vehicle("A1", TripStatus::Available, Some(1.0)),
            vehicle("M1", TripStatus::Maintenance, Some(1.0)),
        ];
        let trips = HashMap::new();
        let snapshot = classify(&fleet, &trips);

        let report = build_report(
            &snapshot,
            &trips,
            &DocumentRegistry::new(),
            "2025-06-01T12:00:00Z".parse().unwrap(),
        );

        assert_eq!(report.buckets.len(), 8);
        assert_eq!(report.buckets[0].status, TripStatus::Available);
        assert_eq!(report.buckets[0].title, "Available Vehicles");
        assert_eq!(report.buckets[0].count, 1);
        assert_eq!(report.buckets[7].status, TripStatus::Maintenance);
        assert_eq!(report.buckets[7].count, 1);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_stats()).unwrap();
    }
}
