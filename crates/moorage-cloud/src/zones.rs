//! Zone resolution
//!
//! Placement comes from two places: the provider's structured instance
//! fields, and (for the local host) an instance-metadata endpoint whose
//! zone string is reduced to a region heuristically. The structured
//! field wins whenever both are available.

use crate::api::ComputeApi;
use crate::cloud::ZoneOps;
use crate::error::{CloudError, Result};
use crate::provider_id::ProviderIdCodec;
use crate::types::{Instance, Zone};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded-timeout reader of a provider's instance-metadata endpoint.
///
/// Fetches serialize through the instance-owned lock; the endpoints are
/// link-local services that misbehave under concurrent readers.
pub struct MetadataZoneSource {
    client: reqwest::Client,
    url: String,
    lock: Mutex<()>,
}

impl MetadataZoneSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            lock: Mutex::new(()),
        }
    }

    /// Read the availability-zone string of the local host
    pub async fn fetch_zone(&self) -> Result<String> {
        let _guard = self.lock.lock().await;
        tracing::debug!("Fetching zone from metadata endpoint: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| CloudError::MetadataUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CloudError::MetadataUnavailable(format!(
                "metadata endpoint returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CloudError::MetadataUnavailable(e.to_string()))
            .map(|zone| zone.trim().to_string())
    }
}

/// Derive the region from an availability-zone name by dropping the
/// trailing zone-suffix character (`us-east-1a` -> `us-east-1`).
pub fn az_to_region(az: &str) -> Result<&str> {
    if az.is_empty() {
        return Err(CloudError::MetadataUnavailable(
            "invalid (empty) availability zone".to_string(),
        ));
    }
    let mut chars = az.chars();
    chars.next_back();
    Ok(chars.as_str())
}

/// Generic zone resolver over one provider's compute API
pub struct ZoneResolver<C> {
    compute: C,
    codec: ProviderIdCodec,
    static_region: Option<String>,
    metadata: Option<MetadataZoneSource>,
}

impl<C: ComputeApi> ZoneResolver<C> {
    pub fn new(compute: C, codec: ProviderIdCodec) -> Self {
        Self {
            compute,
            codec,
            static_region: None,
            metadata: None,
        }
    }

    /// Configure the region the facade was deployed into; takes
    /// precedence over the metadata endpoint.
    pub fn with_static_region(mut self, region: impl Into<String>) -> Self {
        self.static_region = Some(region.into());
        self
    }

    /// Configure a metadata endpoint for local-host zone discovery
    pub fn with_metadata_source(mut self, source: MetadataZoneSource) -> Self {
        self.metadata = Some(source);
        self
    }

    fn zone_of(instance: &Instance) -> Zone {
        Zone {
            region: instance.region.clone(),
            failure_domain: instance.zone.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl<C: ComputeApi> ZoneOps for ZoneResolver<C> {
    async fn current_zone(&self) -> Result<Zone> {
        if let Some(region) = &self.static_region {
            return Ok(Zone::region(region.clone()));
        }
        if let Some(metadata) = &self.metadata {
            let az = metadata.fetch_zone().await?;
            let region = az_to_region(&az)?.to_string();
            return Ok(Zone {
                region,
                failure_domain: az,
            });
        }
        Err(CloudError::Unsupported(
            "provider has no local zone source".to_string(),
        ))
    }

    async fn zone_by_provider_id(&self, provider_id: &str) -> Result<Zone> {
        let id = self.codec.decode(provider_id)?;
        let instance = self.compute.get_instance(id).await?;
        Ok(Self::zone_of(&instance))
    }

    async fn zone_by_node_name(&self, node_name: &str) -> Result<Zone> {
        let instances = self.compute.list_instances().await?;
        let instance = instances
            .into_iter()
            .find(|i| i.name == node_name)
            .ok_or_else(|| CloudError::InstanceNotFound(node_name.to_string()))?;
        Ok(Self::zone_of(&instance))
    }
}
