//! Place resolution.
//!
//! Different statuses carry positional truth in different record fields: live
//! GPS waypoint, trip endpoints, or route annotations. This resolver
//! centralizes that mapping so table rendering, branch aggregation, and the
//! place filter all see one consistent place string per vehicle.

use crate::model::{Trip, TripProgress, TripStatus, TripsByVehicle, Vehicle};

/// Sentinel shown when no positional source yields a name.
pub const PLACE_UNKNOWN: &str = "-";

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}

fn destination_name(trip: Option<&Trip>) -> Option<String> {
    non_empty(trip?.destination.as_ref()?.name.as_deref()).map(str::to_string)
}

fn origin_name(trip: Option<&Trip>) -> Option<String> {
    non_empty(trip?.origin.as_ref()?.name.as_deref()).map(str::to_string)
}

/// First maintenance service-station name among a trip's intermediate points.
fn maintenance_place(trip: Option<&Trip>) -> Option<String> {
    trip?
        .intermediate_points
        .as_deref()?
        .iter()
        .find_map(|p| {
            non_empty(p.maintenance.as_ref()?.service_station.as_ref()?.name.as_deref())
        })
        .map(str::to_string)
}

/// First off-duty area name among a trip's intermediate points.
fn off_duty_area(trip: Option<&Trip>) -> Option<String> {
    trip?
        .intermediate_points
        .as_deref()?
        .iter()
        .find_map(|p| non_empty(p.off_duty.as_ref()?.area.as_ref()?.name.as_deref()))
        .map(str::to_string)
}

/// Resolves a human-readable place for a vehicle in the given status.
///
/// Returns `None` only for an at-unloading vehicle with no waypoint name;
/// every other arm falls back to [`PLACE_UNKNOWN`]. The asymmetry is
/// deliberate and matched by the renderer.
pub fn resolve_place(
    vehicle: &Vehicle,
    status: TripStatus,
    trips: &TripsByVehicle,
) -> Option<String> {
    let all_trips = trips
        .get(&vehicle.vehicle_number)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let latest = all_trips.first();
    let waypoint_name = vehicle
        .waypoint
        .as_ref()
        .and_then(|w| non_empty(w.name.as_deref()))
        .map(str::to_string);

    match status {
        TripStatus::Available => {
            if latest.map(|t| t.status) == Some(TripProgress::Discarded) {
                let complete = all_trips.iter().find(|t| t.status == TripProgress::Complete);
                if let Some(name) = destination_name(complete) {
                    return Some(name);
                }
                if let Some(place) = maintenance_place(complete) {
                    return Some(place);
                }
                if let Some(area) = off_duty_area(complete) {
                    return Some(area);
                }
            }
            if let Some(name) = destination_name(latest) {
                return Some(name);
            }
            if let Some(place) = maintenance_place(latest) {
                return Some(place);
            }
            if let Some(area) = off_duty_area(latest) {
                return Some(area);
            }
            Some(PLACE_UNKNOWN.to_string())
        }
        TripStatus::InTransit => {
            Some(waypoint_name.unwrap_or_else(|| PLACE_UNKNOWN.to_string()))
        }
        TripStatus::AtUnloading => waypoint_name,
        TripStatus::AtPickup | TripStatus::EnrouteForPickup => {
            Some(origin_name(latest).unwrap_or_else(|| PLACE_UNKNOWN.to_string()))
        }
        TripStatus::OffDuty => {
            // first intermediate point only, not searched across the route
            let area = latest
                .and_then(|t| t.intermediate_points.as_deref())
                .and_then(|points| points.first())
                .and_then(|p| p.off_duty.as_ref())
                .and_then(|o| o.area.as_ref())
                .and_then(|a| non_empty(a.name.as_deref()))
                .map(str::to_string);
            Some(area.unwrap_or_else(|| PLACE_UNKNOWN.to_string()))
        }
        TripStatus::Maintenance => {
            let station = latest
                .and_then(|t| t.intermediate_points.as_deref())
                .and_then(|points| points.first())
                .and_then(|p| p.maintenance.as_ref())
                .and_then(|m| m.service_station.as_ref())
                .and_then(|s| non_empty(s.name.as_deref()))
                .map(str::to_string);
            Some(station.unwrap_or_else(|| PLACE_UNKNOWN.to_string()))
        }
        TripStatus::EmptyMovement | TripStatus::Unrecognized => {
            Some(waypoint_name.unwrap_or_else(|| PLACE_UNKNOWN.to_string()))
        }
    }
}
