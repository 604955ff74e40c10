//! Snapshot assembly, bucket partition, and row annotation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::classifier::distance::{format_distance, pending_distance_km, DISTANCE_UNKNOWN};
use crate::classifier::documents::{lookup, DocTier, DocumentKind, DocumentRegistry};
use crate::classifier::halting::{format_halt_hours, sort_by_halt_priority, HaltTier};
use crate::classifier::location::{resolve_place, PLACE_UNKNOWN};
use crate::model::{TripStatus, TripsByVehicle, Vehicle, WaypointsByVehicle};

/// Merges batch-fetched waypoints and trip histories into the vehicle set.
///
/// Halting hours default to zero when the waypoint is missing or carries
/// none, the embedded waypoint is replaced by the batch result, and the
/// latest trip id is attached. Produces a new set; inputs are untouched.
pub fn attach_telemetry(
    vehicles: Vec<Vehicle>,
    waypoints: &WaypointsByVehicle,
    trips: &TripsByVehicle,
) -> Vec<Vehicle> {
    vehicles
        .into_iter()
        .map(|mut vehicle| {
            let waypoint = waypoints.get(&vehicle.vehicle_number).cloned();
            vehicle.halting_hours =
                Some(waypoint.as_ref().and_then(|w| w.halting_hours).unwrap_or(0.0));
            vehicle.waypoint = waypoint;
            vehicle.current_trip_id = trips
                .get(&vehicle.vehicle_number)
                .and_then(|history| history.first())
                .map(|trip| trip.id.clone());
            vehicle
        })
        .collect()
}

/// Per-status counts, the dashboard's header stat cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    pub total: usize,
    pub available: usize,
    pub in_transit: usize,
    pub at_unloading: usize,
    pub empty_movement: usize,
    pub off_duty: usize,
    pub at_pickup: usize,
    pub enroute_for_pickup: usize,
    pub maintenance: usize,
    /// Vehicles whose status matched none of the eight buckets.
    pub unrecognized: usize,
}

/// The eight status buckets, each sorted by halting priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Buckets {
    pub available: Vec<Vehicle>,
    pub in_transit: Vec<Vehicle>,
    pub at_unloading: Vec<Vehicle>,
    pub empty_movement: Vec<Vehicle>,
    pub off_duty: Vec<Vehicle>,
    pub at_pickup: Vec<Vehicle>,
    pub enroute_for_pickup: Vec<Vehicle>,
    pub maintenance: Vec<Vehicle>,
}

impl Buckets {
    /// Bucket for a status; `None` for [`TripStatus::Unrecognized`].
    pub fn get(&self, status: TripStatus) -> Option<&[Vehicle]> {
        match status {
            TripStatus::Available => Some(&self.available),
            TripStatus::InTransit => Some(&self.in_transit),
            TripStatus::AtUnloading => Some(&self.at_unloading),
            TripStatus::EmptyMovement => Some(&self.empty_movement),
            TripStatus::OffDuty => Some(&self.off_duty),
            TripStatus::AtPickup => Some(&self.at_pickup),
            TripStatus::EnrouteForPickup => Some(&self.enroute_for_pickup),
            TripStatus::Maintenance => Some(&self.maintenance),
            TripStatus::Unrecognized => None,
        }
    }

    fn get_mut(&mut self, status: TripStatus) -> Option<&mut Vec<Vehicle>> {
        match status {
            TripStatus::Available => Some(&mut self.available),
            TripStatus::InTransit => Some(&mut self.in_transit),
            TripStatus::AtUnloading => Some(&mut self.at_unloading),
            TripStatus::EmptyMovement => Some(&mut self.empty_movement),
            TripStatus::OffDuty => Some(&mut self.off_duty),
            TripStatus::AtPickup => Some(&mut self.at_pickup),
            TripStatus::EnrouteForPickup => Some(&mut self.enroute_for_pickup),
            TripStatus::Maintenance => Some(&mut self.maintenance),
            TripStatus::Unrecognized => None,
        }
    }

    /// Buckets in dashboard display order.
    pub fn iter(&self) -> impl Iterator<Item = (TripStatus, &[Vehicle])> {
        TripStatus::RECOGNIZED
            .into_iter()
            .map(|status| (status, self.get(status).unwrap_or(&[])))
    }

    /// Total vehicles across all buckets.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One vehicle tallied under a branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchVehicle {
    pub vehicle_number: String,
    pub halting_hours: f64,
}

/// Available-vehicle tally for one resolved place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchAvailability {
    pub branch: String,
    pub count: usize,
    pub vehicles: Vec<BranchVehicle>,
}

/// A classified fleet snapshot: counts, buckets, and branch availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSnapshot {
    pub stats: FleetStats,
    pub buckets: Buckets,
    pub branches: Vec<BranchAvailability>,
}

/// Partitions the vehicle set into status buckets, orders each bucket by
/// halting priority, and tallies branch availability.
///
/// The partition is total over the recognized statuses: every vehicle lands
/// in exactly the bucket matching its status, and unrecognized statuses are
/// counted but join no bucket. Pure over its inputs, so repeated runs on the
/// same snapshot yield identical output.
pub fn classify(vehicles: &[Vehicle], trips: &TripsByVehicle) -> FleetSnapshot {
    let mut buckets = Buckets::default();
    let mut unrecognized = 0usize;

    for vehicle in vehicles {
        match buckets.get_mut(vehicle.current_trip_status) {
            Some(bucket) => bucket.push(vehicle.clone()),
            None => unrecognized += 1,
        }
    }

    for status in TripStatus::RECOGNIZED {
        if let Some(bucket) = buckets.get_mut(status) {
            sort_by_halt_priority(bucket);
        }
    }

    let stats = FleetStats {
        total: vehicles.len(),
        available: buckets.available.len(),
        in_transit: buckets.in_transit.len(),
        at_unloading: buckets.at_unloading.len(),
        empty_movement: buckets.empty_movement.len(),
        off_duty: buckets.off_duty.len(),
        at_pickup: buckets.at_pickup.len(),
        enroute_for_pickup: buckets.enroute_for_pickup.len(),
        maintenance: buckets.maintenance.len(),
        unrecognized,
    };

    let branches = branch_availability(&buckets.available, trips);

    FleetSnapshot {
        stats,
        buckets,
        branches,
    }
}

/// Tallies available vehicles per resolved place, with the vehicles behind
/// each count. Ordered by branch name so repeated runs are identical.
pub fn branch_availability(
    available: &[Vehicle],
    trips: &TripsByVehicle,
) -> Vec<BranchAvailability> {
    let mut by_place: BTreeMap<String, Vec<BranchVehicle>> = BTreeMap::new();

    for vehicle in available {
        let place = resolve_place(vehicle, TripStatus::Available, trips)
            .unwrap_or_else(|| PLACE_UNKNOWN.to_string());
        by_place.entry(place).or_default().push(BranchVehicle {
            vehicle_number: vehicle.vehicle_number.clone(),
            halting_hours: vehicle.halt_hours(),
        });
    }

    by_place
        .into_iter()
        .map(|(branch, vehicles)| BranchAvailability {
            branch,
            count: vehicles.len(),
            vehicles,
        })
        .collect()
}

/// A fully annotated display row for one vehicle, as handed to the table
/// renderer and exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRow {
    pub vehicle_number: String,
    pub vehicle_type: String,
    pub status: TripStatus,
    pub place: Option<String>,
    pub destination: Option<String>,
    pub halt_hours: f64,
    pub halt_display: String,
    pub halt_tier: HaltTier,
    pub pending_distance: String,
    pub pollution: DocTier,
    pub permit: DocTier,
    pub fitness: DocTier,
    pub updated_at: DateTime<Utc>,
}

/// Annotates one vehicle with place, halting tier, document health, and
/// distance-to-destination. Distance applies to vehicles on a trip; the
/// available bucket always shows the unknown sentinel.
pub fn annotate(
    vehicle: &Vehicle,
    trips: &TripsByVehicle,
    registry: &DocumentRegistry,
    now: DateTime<Utc>,
) -> VehicleRow {
    let status = vehicle.current_trip_status;
    let latest_trip = trips
        .get(&vehicle.vehicle_number)
        .and_then(|history| history.first());

    let pending_distance = if status == TripStatus::Available {
        DISTANCE_UNKNOWN.to_string()
    } else {
        format_distance(pending_distance_km(vehicle, latest_trip))
    };

    let halt_hours = vehicle.halt_hours();

    VehicleRow {
        vehicle_number: vehicle.vehicle_number.clone(),
        vehicle_type: vehicle.vehicle_type.clone(),
        status,
        place: resolve_place(vehicle, status, trips),
        destination: latest_trip
            .and_then(|t| t.destination.as_ref())
            .and_then(|d| d.name.clone()),
        halt_hours,
        halt_display: format_halt_hours(halt_hours),
        halt_tier: HaltTier::from_hours(halt_hours),
        pending_distance,
        pollution: lookup(registry, &vehicle.vehicle_number, DocumentKind::Pollution, now),
        permit: lookup(registry, &vehicle.vehicle_number, DocumentKind::Permit, now),
        fitness: lookup(registry, &vehicle.vehicle_number, DocumentKind::Fitness, now),
        updated_at: vehicle.updated_at,
    }
}

/// Annotates every vehicle in a bucket, preserving bucket order.
pub fn annotate_bucket(
    bucket: &[Vehicle],
    trips: &TripsByVehicle,
    registry: &DocumentRegistry,
    now: DateTime<Utc>,
) -> Vec<VehicleRow> {
    bucket
        .iter()
        .map(|vehicle| annotate(vehicle, trips, registry, now))
        .collect()
}

/// Keeps vehicles whose resolved place contains `query`, case-insensitively.
/// A blank query keeps everything.
pub fn filter_by_place(
    vehicles: &[Vehicle],
    trips: &TripsByVehicle,
    query: &str,
) -> Vec<Vehicle> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return vehicles.to_vec();
    }

    vehicles
        .iter()
        .filter(|vehicle| {
            resolve_place(vehicle, vehicle.current_trip_status, trips)
                .is_some_and(|place| place.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Keeps vehicles updated at or after `since`.
pub fn filter_updated_since(vehicles: &[Vehicle], since: DateTime<Utc>) -> Vec<Vehicle> {
    vehicles
        .iter()
        .filter(|vehicle| vehicle.updated_at >= since)
        .cloned()
        .collect()
}
