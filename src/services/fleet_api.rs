//! Trait and response envelope for the fleet data API.

use anyhow::Result;
use serde::Deserialize;

use fleet_monitor::model::{Remark, TripsByVehicle, Vehicle, WaypointsByVehicle};

/// Response envelope shared by every fleet endpoint: `status` is `"success"`
/// or an error tag, `message` carries the server's failure text.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Unwraps the payload on success, otherwise surfaces the server message
    /// or a generic fallback naming `what`.
    pub fn into_data(self, what: &str) -> Result<T> {
        if !self.is_success() {
            let message = self
                .message
                .unwrap_or_else(|| format!("Failed to fetch {what}"));
            anyhow::bail!("{message}");
        }
        self.data
            .ok_or_else(|| anyhow::anyhow!("Empty response for {what}"))
    }
}

/// Abstraction over the fleet data API.
#[async_trait::async_trait]
pub trait FleetApi {
    /// All vehicles in the named group. A non-success response is fatal.
    async fn list_vehicles(&self, group: &str) -> Result<Vec<Vehicle>>;

    /// Live waypoints for the given vehicle numbers, fetched in chunks.
    async fn waypoints_batch(&self, numbers: &[String]) -> Result<WaypointsByVehicle>;

    /// Trip histories (most-recent-first) for the given vehicle numbers,
    /// fetched in chunks.
    async fn trips_batch(&self, numbers: &[String]) -> Result<TripsByVehicle>;

    /// Latest remark for a vehicle by its internal id, if any.
    async fn latest_remark(&self, vehicle_id: &str) -> Result<Option<Remark>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_unwraps_data() {
        let envelope: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"status": "success", "data": [1, 2]}"#).unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.into_data("numbers").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_envelope_failure_surfaces_server_message() {
        let envelope: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"status": "error", "message": "group not found"}"#).unwrap();

        let err = envelope.into_data("vehicle listing").unwrap_err();
        assert_eq!(err.to_string(), "group not found");
    }

    #[test]
    fn test_envelope_failure_without_message_gets_fallback() {
        let envelope: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"status": "error"}"#).unwrap();

        let err = envelope.into_data("vehicle listing").unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch vehicle listing");
    }
}
