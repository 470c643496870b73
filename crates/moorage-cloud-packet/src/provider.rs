//! Packet cloud facade
//!
//! Devices are project-scoped and pinned to a facility. The configured
//! zone answers local zone queries; per-node zones come from the
//! facility code on each device. No load-balancer surface exists.

use crate::client::{DeviceInfo, PacketApi};
use crate::error::{PacketError, Result};
use async_trait::async_trait;
use moorage_cloud::{
    Cloud, CloudError, CloudRegistry, ComputeApi, Instance, InstanceOps, InstanceResolver,
    LoadBalancerOps, ProviderIdCodec, ZoneOps, ZoneResolver,
};
use serde::Deserialize;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "packet";

/// Credentials and placement for one Packet facade
#[derive(Debug, Clone, Deserialize)]
pub struct PacketConfig {
    pub token: String,
    pub project_id: String,

    /// Facility code the control plane runs in, answering `current_zone`.
    pub zone: String,
}

impl PacketConfig {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("PACKET_API_TOKEN")
            .map_err(|_| PacketError::MissingEnvVar("PACKET_API_TOKEN".to_string()))?;
        let project_id = std::env::var("PACKET_PROJECT_ID")
            .map_err(|_| PacketError::MissingEnvVar("PACKET_PROJECT_ID".to_string()))?;
        let zone = std::env::var("PACKET_ZONE")
            .map_err(|_| PacketError::MissingEnvVar("PACKET_ZONE".to_string()))?;
        Ok(Self {
            token,
            project_id,
            zone,
        })
    }
}

/// Packet provider facade
pub struct PacketCloud {
    instances: InstanceResolver<Arc<PacketApi>>,
    zones: ZoneResolver<Arc<PacketApi>>,
}

impl PacketCloud {
    pub fn new(config: PacketConfig) -> Self {
        let api = Arc::new(PacketApi::new(config.token, config.project_id));
        Self::with_api(api, config.zone)
    }

    pub fn with_api(api: Arc<PacketApi>, zone: impl Into<String>) -> Self {
        let codec = ProviderIdCodec::new(PROVIDER_NAME);
        Self {
            instances: InstanceResolver::new(api.clone(), codec),
            zones: ZoneResolver::new(api, codec).with_static_region(zone),
        }
    }

    pub fn register(registry: &mut CloudRegistry) {
        registry.register(
            PROVIDER_NAME,
            Box::new(|config| {
                let config: PacketConfig = serde_json::from_value(config.clone())
                    .map_err(|e| CloudError::Validation(format!("packet config: {e}")))?;
                Ok(Arc::new(PacketCloud::new(config)))
            }),
        );
    }
}

impl Cloud for PacketCloud {
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

fn to_instance(device: DeviceInfo) -> Instance {
    Instance {
        id: device.id.clone(),
        name: device.hostname.clone(),
        internal_ip: device.private_ipv4().map(str::to_string),
        external_ip: device.public_ipv4().map(str::to_string),
        instance_type: device.plan.slug.clone(),
        region: device.facility.code.clone(),
        zone: Some(device.facility.code.clone()),
    }
}

#[async_trait]
impl ComputeApi for PacketApi {
    async fn list_instances(&self) -> moorage_cloud::Result<Vec<Instance>> {
        let devices = self.list_devices().await?;
        Ok(devices.into_iter().map(to_instance).collect())
    }

    async fn get_instance(&self, id: &str) -> moorage_cloud::Result<Instance> {
        Ok(to_instance(self.get_device(id).await?))
    }
}
