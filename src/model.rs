//! Wire-level records for the fleet API.
//!
//! Field names follow the upstream JSON: camelCase keys, Mongo-style `_id`,
//! and the tracking provider's `lngt` spelling. Every record is a read-only
//! snapshot; a refresh fully replaces the working set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trip histories keyed by vehicle number, most-recent-first.
pub type TripsByVehicle = HashMap<String, Vec<Trip>>;

/// Live waypoints keyed by vehicle number.
pub type WaypointsByVehicle = HashMap<String, Waypoint>;

/// Current trip status of a vehicle, as reported by the vehicle listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    Available,
    InTransit,
    AtUnloading,
    EmptyMovement,
    OffDuty,
    AtPickup,
    EnrouteForPickup,
    Maintenance,
    /// Any status string this build does not recognize. The vehicle stays in
    /// the source set but joins no bucket.
    #[serde(other)]
    Unrecognized,
}

impl TripStatus {
    /// The eight recognized statuses, in dashboard display order.
    pub const RECOGNIZED: [TripStatus; 8] = [
        TripStatus::Available,
        TripStatus::AtUnloading,
        TripStatus::InTransit,
        TripStatus::EmptyMovement,
        TripStatus::OffDuty,
        TripStatus::AtPickup,
        TripStatus::EnrouteForPickup,
        TripStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Available => "available",
            TripStatus::InTransit => "in-transit",
            TripStatus::AtUnloading => "at-unloading",
            TripStatus::EmptyMovement => "empty-movement",
            TripStatus::OffDuty => "off-duty",
            TripStatus::AtPickup => "at-pickup",
            TripStatus::EnrouteForPickup => "enroute-for-pickup",
            TripStatus::Maintenance => "maintenance",
            TripStatus::Unrecognized => "unrecognized",
        }
    }

    /// Section title used for the per-status tables and exports.
    pub fn title(self) -> &'static str {
        match self {
            TripStatus::Available => "Available Vehicles",
            TripStatus::InTransit => "In Transit Vehicles",
            TripStatus::AtUnloading => "At Unloading Vehicles",
            TripStatus::EmptyMovement => "Empty Movement Vehicles",
            TripStatus::OffDuty => "Off Duty Vehicles",
            TripStatus::AtPickup => "At Pickup Vehicles",
            TripStatus::EnrouteForPickup => "Enroute for Pickup",
            TripStatus::Maintenance => "Maintenance Vehicles",
            TripStatus::Unrecognized => "Unrecognized",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress state of a single trip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripProgress {
    Active,
    Complete,
    Discarded,
    #[serde(other)]
    Other,
}

/// Last reported position and timing metadata for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Report timestamp in the tracking provider's own format.
    #[serde(default, rename = "dttime")]
    pub reported_at: Option<String>,
    #[serde(default)]
    pub halting_hours: Option<f64>,
    #[serde(default, rename = "vname")]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, rename = "lngt")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
}

/// A fleet vehicle as returned by the vehicle listing, enriched after fetch
/// with its live waypoint and latest trip id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "_id")]
    pub id: String,
    pub vehicle_number: String,
    #[serde(default)]
    pub vehicle_type: String,
    pub current_trip_status: TripStatus,
    #[serde(default)]
    pub current_trip_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub halting_hours: Option<f64>,
    #[serde(default)]
    pub waypoint: Option<Waypoint>,
}

impl Vehicle {
    /// Halting hours from the live waypoint; absent means unknown and counts
    /// as zero everywhere downstream.
    pub fn halt_hours(&self) -> f64 {
        self.waypoint
            .as_ref()
            .and_then(|w| w.halting_hours)
            .or(self.halting_hours)
            .unwrap_or(0.0)
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Origin or destination of a trip.
///
/// Older records carry flat `latitude`/`longitude` fields, newer ones a
/// nested `coordinates` pair; [`TripEndpoint::lat_lng`] accepts either,
/// preferring the flat fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEndpoint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl TripEndpoint {
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            return Some((lat, lng));
        }
        self.coordinates.as_ref().map(|c| (c.lat, c.lng))
    }
}

/// A named place referenced from a route annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    #[serde(default)]
    pub name: Option<String>,
}

/// Maintenance annotation on an intermediate point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStop {
    #[serde(default)]
    pub service_station: Option<NamedPlace>,
}

/// Off-duty annotation on an intermediate point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffDutyStop {
    #[serde(default)]
    pub area: Option<NamedPlace>,
}

/// A recorded stop along a trip's route. The maintenance and off-duty
/// annotations are mutually exclusive on real data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediatePoint {
    #[serde(default)]
    pub maintenance: Option<MaintenanceStop>,
    #[serde(default)]
    pub off_duty: Option<OffDutyStop>,
}

/// A single trip record from the trip batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id")]
    pub id: String,
    pub vehicle_number: String,
    #[serde(default)]
    pub origin: Option<TripEndpoint>,
    #[serde(default)]
    pub destination: Option<TripEndpoint>,
    pub status: TripProgress,
    #[serde(default)]
    pub intermediate_points: Option<Vec<IntermediatePoint>>,
}

/// Expiry dates for one vehicle's statutory documents, from the static
/// document registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub vehicle_number: String,
    #[serde(default, rename = "pucExpiry")]
    pub pollution_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub permit_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fitness_expiry: Option<DateTime<Utc>>,
}

/// Latest free-text remark for a vehicle, with its author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_role: Option<String>,
}
