//! Distance-to-destination for vehicles on a trip.

use crate::model::{Trip, Vehicle};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Display sentinel when either side lacks coordinates.
pub const DISTANCE_UNKNOWN: &str = "N/A";

/// Great-circle distance between two points via the haversine formula.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from the vehicle's live waypoint to the latest trip's
/// destination. `None` when any coordinate is missing on either side.
pub fn pending_distance_km(vehicle: &Vehicle, latest_trip: Option<&Trip>) -> Option<f64> {
    let waypoint = vehicle.waypoint.as_ref()?;
    let (lat1, lon1) = (waypoint.lat?, waypoint.lng?);
    let (lat2, lon2) = latest_trip?.destination.as_ref()?.lat_lng()?;

    Some(haversine_km(lat1, lon1, lat2, lon2))
}

/// Two-decimal display string with a `km` suffix, or [`DISTANCE_UNKNOWN`].
pub fn format_distance(km: Option<f64>) -> String {
    match km {
        Some(km) => format!("{km:.2} km"),
        None => DISTANCE_UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, TripEndpoint, TripProgress, TripStatus, Waypoint};

    fn vehicle_at(lat: Option<f64>, lng: Option<f64>) -> Vehicle {
        Vehicle {
            id: "id-V1".to_string(),
            vehicle_number: "V1".to_string(),
            vehicle_type: "17-feet".to_string(),
            current_trip_status: TripStatus::InTransit,
            current_trip_id: None,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2025-06-01T00:00:00Z".parse().unwrap(),
            halting_hours: None,
            waypoint: Some(Waypoint {
                reported_at: None,
                halting_hours: None,
                vehicle_name: None,
                lat,
                lng,
                name: None,
                full_address: None,
            }),
        }
    }

    fn trip_to(destination: TripEndpoint) -> Trip {
        Trip {
            id: "trip-1".to_string(),
            vehicle_number: "V1".to_string(),
            origin: None,
            destination: Some(destination),
            status: TripProgress::Active,
            intermediate_points: None,
        }
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let km = haversine_km(0.0, 0.0, 0.0, 1.0);
        // 6371 * pi / 180
        assert!((km - 111.19).abs() < 0.01);
        assert_eq!(format_distance(Some(km)), "111.19 km");
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_km(18.52, 73.85, 18.52, 73.85), 0.0);
    }

    #[test]
    fn test_pending_distance_with_nested_coordinates() {
        let vehicle = vehicle_at(Some(0.0), Some(0.0));
        let trip = trip_to(TripEndpoint {
            coordinates: Some(Coordinates { lat: 0.0, lng: 1.0 }),
            ..Default::default()
        });

        let km = pending_distance_km(&vehicle, Some(&trip)).unwrap();
        assert!((km - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_pending_distance_prefers_flat_fields() {
        let vehicle = vehicle_at(Some(0.0), Some(0.0));
        let trip = trip_to(TripEndpoint {
            latitude: Some(0.0),
            longitude: Some(2.0),
            coordinates: Some(Coordinates { lat: 0.0, lng: 1.0 }),
            ..Default::default()
        });

        let km = pending_distance_km(&vehicle, Some(&trip)).unwrap();
        assert!((km - 222.39).abs() < 0.01);
    }

    #[test]
    fn test_missing_coordinates_yield_none() {
        let trip = trip_to(TripEndpoint {
            coordinates: Some(Coordinates { lat: 0.0, lng: 1.0 }),
            ..Default::default()
        });

        // no waypoint longitude
        let vehicle = vehicle_at(Some(0.0), None);
        assert_eq!(pending_distance_km(&vehicle, Some(&trip)), None);

        // no waypoint at all
        let mut vehicle = vehicle_at(None, None);
        vehicle.waypoint = None;
        assert_eq!(pending_distance_km(&vehicle, Some(&trip)), None);

        // no trip
        let vehicle = vehicle_at(Some(0.0), Some(0.0));
        assert_eq!(pending_distance_km(&vehicle, None), None);

        // destination without coordinates
        let bare = trip_to(TripEndpoint::default());
        assert_eq!(pending_distance_km(&vehicle, Some(&bare)), None);

        assert_eq!(format_distance(None), "N/A");
    }
}
