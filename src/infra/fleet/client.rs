use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::services::fleet_api::{ApiResponse, FleetApi};
use fleet_monitor::fetch::batch::{chunk_numbers, merge_chunks, MergePolicy, MAX_BATCH};
use fleet_monitor::model::{Remark, TripsByVehicle, Vehicle, WaypointsByVehicle};

#[derive(Debug, Deserialize)]
struct VehicleListData {
    #[serde(default)]
    vehicles: Vec<Vehicle>,
}

/// Reqwest-backed [`FleetApi`] implementation.
///
/// Batch endpoints are fanned out over chunks of at most [`MAX_BATCH`]
/// vehicle numbers with bounded concurrency and folded per the merge policy.
pub struct FleetApiClient {
    base_url: String,
    client: reqwest::Client,
    concurrency: usize,
    merge_policy: MergePolicy,
}

impl FleetApiClient {
    pub fn new(base_url: String, concurrency: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            concurrency: concurrency.max(1),
            merge_policy: MergePolicy::BestEffort,
        })
    }

    /// Switches how failed batch chunks are handled. The default is
    /// [`MergePolicy::BestEffort`].
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    async fn get_envelope<T: DeserializeOwned>(&self, url: String) -> Result<ApiResponse<T>> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))
    }

    /// Fans a batch endpoint out over vehicle-number chunks, joining all
    /// requests before merging. A non-success chunk response is an error for
    /// that chunk only under [`MergePolicy::BestEffort`].
    async fn fetch_batched<T>(
        &self,
        path: &str,
        param: &str,
        numbers: &[String],
    ) -> Result<HashMap<String, T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let chunks = chunk_numbers(numbers, MAX_BATCH);
        debug!(path, chunk_count = chunks.len(), "Dispatching batch chunks");

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let url = format!(
                "{}/{}?{}={}",
                self.base_url,
                path,
                param,
                chunk.join(",")
            );
            let client = self.client.clone();
            let sem = semaphore.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = sem.acquire().await?;

                let response = client.get(&url).send().await?;
                if !response.status().is_success() {
                    anyhow::bail!("API returned status {}", response.status());
                }

                let envelope: ApiResponse<HashMap<String, T>> = response.json().await?;
                envelope.into_data("batch chunk")
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(
                task.await
                    .unwrap_or_else(|e| Err(anyhow::anyhow!("Batch task panicked: {}", e))),
            );
        }

        merge_chunks(results, self.merge_policy)
    }
}

#[async_trait]
impl FleetApi for FleetApiClient {
    async fn list_vehicles(&self, group: &str) -> Result<Vec<Vehicle>> {
        let url = format!("{}/api/vehicles?group={}", self.base_url, group);

        let envelope: ApiResponse<VehicleListData> = self.get_envelope(url).await?;
        Ok(envelope.into_data("vehicle listing")?.vehicles)
    }

    async fn waypoints_batch(&self, numbers: &[String]) -> Result<WaypointsByVehicle> {
        self.fetch_batched("api/halting-hours/batch", "vnames", numbers)
            .await
    }

    async fn trips_batch(&self, numbers: &[String]) -> Result<TripsByVehicle> {
        self.fetch_batched("api/trip/batch", "vehicleNumbers", numbers)
            .await
    }

    async fn latest_remark(&self, vehicle_id: &str) -> Result<Option<Remark>> {
        let url = format!("{}/api/fleet-remarks?fleetId={}", self.base_url, vehicle_id);

        let envelope: ApiResponse<Remark> = self.get_envelope(url).await?;
        if !envelope.is_success() {
            return Ok(None);
        }

        Ok(envelope.data.filter(|r| r.remark.is_some()))
    }
}
