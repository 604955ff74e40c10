use chrono::{DateTime, Utc};
use serde::Deserialize;

use fleet_monitor::classifier::distance::haversine_km;
use fleet_monitor::classifier::documents::{build_registry, DocTier};
use fleet_monitor::classifier::snapshot::{attach_telemetry, classify};
use fleet_monitor::model::{
    DocumentRecord, TripStatus, TripsByVehicle, Vehicle, WaypointsByVehicle,
};
use fleet_monitor::output::build_report;

/// Batch-endpoint payloads captured as one fixture file.
#[derive(Deserialize)]
struct Fixture {
    vehicles: Vec<Vehicle>,
    waypoints: WaypointsByVehicle,
    trips: TripsByVehicle,
    documents: Vec<DocumentRecord>,
}

fn load_fixture() -> Fixture {
    serde_json::from_str(include_str!("fixtures/sample_fleet.json"))
        .expect("Failed to parse fleet fixture")
}

fn fixture_now() -> DateTime<Utc> {
    "2025-06-01T12:00:00Z".parse().unwrap()
}

#[test]
fn test_full_pipeline() {
    let fixture = load_fixture();

    let vehicles = attach_telemetry(fixture.vehicles, &fixture.waypoints, &fixture.trips);
    let snapshot = classify(&vehicles, &fixture.trips);

    assert_eq!(snapshot.stats.total, 7);
    assert_eq!(snapshot.stats.available, 2);
    assert_eq!(snapshot.stats.in_transit, 1);
    assert_eq!(snapshot.stats.at_unloading, 1);
    assert_eq!(snapshot.stats.off_duty, 1);
    assert_eq!(snapshot.stats.maintenance, 1);
    assert_eq!(snapshot.stats.unrecognized, 1);

    // the 30-hour halt outranks the 2-hour one
    let available: Vec<&str> = snapshot
        .buckets
        .available
        .iter()
        .map(|v| v.vehicle_number.as_str())
        .collect();
    assert_eq!(available, vec!["MH12AB1111", "MH12AB2222"]);

    // the unrecognized "workshop" vehicle joins no bucket
    let bucketed: Vec<&str> = snapshot
        .buckets
        .iter()
        .flat_map(|(_, bucket)| bucket.iter().map(|v| v.vehicle_number.as_str()))
        .collect();
    assert_eq!(bucketed.len(), 6);
    assert!(!bucketed.contains(&"MH12AB7777"));
}

#[test]
fn test_branch_availability_from_fixture() {
    let fixture = load_fixture();

    let vehicles = attach_telemetry(fixture.vehicles, &fixture.waypoints, &fixture.trips);
    let snapshot = classify(&vehicles, &fixture.trips);

    // ordered by branch name
    let branches: Vec<(&str, usize)> = snapshot
        .branches
        .iter()
        .map(|b| (b.branch.as_str(), b.count))
        .collect();
    assert_eq!(branches, vec![("Indore Hub", 1), ("Nagpur Depot", 1)]);

    let nagpur = &snapshot.branches[1];
    assert_eq!(nagpur.vehicles[0].vehicle_number, "MH12AB1111");
    assert_eq!(nagpur.vehicles[0].halting_hours, 30.0);
}

#[test]
fn test_classification_is_idempotent() {
    let fixture = load_fixture();

    let vehicles = attach_telemetry(fixture.vehicles, &fixture.waypoints, &fixture.trips);
    let first = classify(&vehicles, &fixture.trips);
    let second = classify(&vehicles, &fixture.trips);

    assert_eq!(first, second);
}

#[test]
fn test_annotated_report() {
    let fixture = load_fixture();
    let registry = build_registry(fixture.documents);
    let now = fixture_now();

    let vehicles = attach_telemetry(fixture.vehicles, &fixture.waypoints, &fixture.trips);
    let snapshot = classify(&vehicles, &fixture.trips);
    let report = build_report(&snapshot, &fixture.trips, &registry, now);

    assert_eq!(report.buckets.len(), 8);
    assert_eq!(report.buckets[0].title, "Available Vehicles");

    let rows: Vec<_> = report
        .buckets
        .iter()
        .flat_map(|b| b.vehicles.iter())
        .collect();

    // MH12AB1111: latest trip discarded with a blank destination, so the
    // place falls back to the completed trip's destination
    let v1111 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB1111")
        .unwrap();
    assert_eq!(v1111.place.as_deref(), Some("Nagpur Depot"));
    assert_eq!(v1111.pollution, DocTier::Danger);
    assert_eq!(v1111.permit, DocTier::Warning);
    assert_eq!(v1111.fitness, DocTier::Ok);
    assert_eq!(v1111.pending_distance, "N/A");

    // MH12AB2222 has no document record at all
    let v2222 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB2222")
        .unwrap();
    assert_eq!(v2222.pollution, DocTier::Danger);
    assert_eq!(v2222.permit, DocTier::Danger);
    assert_eq!(v2222.fitness, DocTier::Danger);

    // MH12AB3333 is in transit: place from the live waypoint, distance from
    // the waypoint to the active trip's destination
    let v3333 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB3333")
        .unwrap();
    assert_eq!(v3333.status, TripStatus::InTransit);
    assert_eq!(v3333.place.as_deref(), Some("Khed Shivapur"));
    assert_eq!(v3333.destination.as_deref(), Some("Solapur Depot"));
    let expected_km = haversine_km(18.0, 74.0, 18.0, 75.0);
    assert_eq!(v3333.pending_distance, format!("{expected_km:.2} km"));
    assert_eq!(v3333.halt_display, "1d 2h");

    // MH12AB4444 is at unloading with no waypoint: the place stays absent
    let v4444 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB4444")
        .unwrap();
    assert_eq!(v4444.place, None);
    assert_eq!(v4444.pending_distance, "N/A");

    // route annotations drive the off-duty and maintenance places
    let v5555 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB5555")
        .unwrap();
    assert_eq!(v5555.place.as_deref(), Some("Wada Naka"));

    let v6666 = rows
        .iter()
        .find(|r| r.vehicle_number == "MH12AB6666")
        .unwrap();
    assert_eq!(v6666.place.as_deref(), Some("Tata Motors Chakan"));
}
