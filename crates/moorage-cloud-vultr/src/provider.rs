//! Vultr cloud facade
//!
//! Compute and zone queries only; Vultr instances here are fronted by
//! an external balancer, so the load-balancer surface is absent and the
//! host treats it as unsupported.

use crate::client::{ServerInfo, VultrApi};
use crate::error::{Result, VultrError};
use async_trait::async_trait;
use moorage_cloud::{
    Cloud, CloudError, CloudRegistry, ComputeApi, Instance, InstanceOps, InstanceResolver,
    LoadBalancerOps, MetadataZoneSource, ProviderIdCodec, ZoneOps, ZoneResolver,
};
use serde::Deserialize;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "vultr";

/// Credentials for one Vultr facade
#[derive(Debug, Clone, Deserialize)]
pub struct VultrConfig {
    pub api_key: String,

    /// Instance-metadata URL serving the local availability zone.
    /// When unset, `current_zone` is unsupported.
    #[serde(default)]
    pub metadata_url: Option<String>,
}

impl VultrConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("VULTR_API_KEY")
            .map_err(|_| VultrError::MissingEnvVar("VULTR_API_KEY".to_string()))?;
        Ok(Self {
            api_key,
            metadata_url: std::env::var("VULTR_METADATA_URL").ok(),
        })
    }
}

/// Vultr provider facade
pub struct VultrCloud {
    instances: InstanceResolver<Arc<VultrApi>>,
    zones: ZoneResolver<Arc<VultrApi>>,
}

impl VultrCloud {
    pub fn new(config: VultrConfig) -> Self {
        Self::with_api(Arc::new(VultrApi::new(config.api_key)), config.metadata_url)
    }

    pub fn with_api(api: Arc<VultrApi>, metadata_url: Option<String>) -> Self {
        let codec = ProviderIdCodec::new(PROVIDER_NAME);
        let mut zones = ZoneResolver::new(api.clone(), codec);
        if let Some(url) = metadata_url {
            zones = zones.with_metadata_source(MetadataZoneSource::new(url));
        }
        Self {
            instances: InstanceResolver::new(api, codec),
            zones,
        }
    }

    pub fn register(registry: &mut CloudRegistry) {
        registry.register(
            PROVIDER_NAME,
            Box::new(|config| {
                let config: VultrConfig = serde_json::from_value(config.clone())
                    .map_err(|e| CloudError::Validation(format!("vultr config: {e}")))?;
                Ok(Arc::new(VultrCloud::new(config)))
            }),
        );
    }
}

impl Cloud for VultrCloud {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn instances(&self) -> Option<&dyn InstanceOps> {
        Some(&self.instances)
    }

    fn zones(&self) -> Option<&dyn ZoneOps> {
        Some(&self.zones)
    }

    fn load_balancers(&self) -> Option<&dyn LoadBalancerOps> {
        None
    }
}

fn to_instance(server: ServerInfo) -> Instance {
    Instance {
        id: server.id.clone(),
        name: server.label.clone(),
        internal_ip: server.private_ip().map(str::to_string),
        external_ip: server.public_ip().map(str::to_string),
        instance_type: server.plan.clone(),
        region: server.region.clone(),
        zone: None,
    }
}

#[async_trait]
impl ComputeApi for VultrApi {
    async fn list_instances(&self) -> moorage_cloud::Result<Vec<Instance>> {
        let servers = self.list_servers().await?;
        Ok(servers.into_iter().map(to_instance).collect())
    }

    async fn get_instance(&self, id: &str) -> moorage_cloud::Result<Instance> {
        Ok(to_instance(self.get_server(id).await?))
    }
}
