//! Host-facing provider contract
//!
//! The control-plane host talks to one [`Cloud`] per cluster. A facade
//! exposes the capability surfaces it actually supports; `None` means
//! the provider has no such feature and the host should treat calls as
//! unsupported.

use crate::error::{CloudError, Result};
use crate::types::{
    LoadBalancerStatus, NodeAddresses, NodeRecord, ServiceSpec, Zone,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-vendor facade composing the engine components
pub trait Cloud: Send + Sync {
    /// Scheme used in this provider's node IDs
    fn provider_name(&self) -> &str;

    fn instances(&self) -> Option<&dyn InstanceOps>;

    fn zones(&self) -> Option<&dyn ZoneOps>;

    fn load_balancers(&self) -> Option<&dyn LoadBalancerOps>;
}

/// Node identity and address queries
#[async_trait]
pub trait InstanceOps: Send + Sync {
    async fn node_addresses(&self, node_name: &str) -> Result<NodeAddresses>;

    async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<NodeAddresses>;

    /// Provider-scoped resource ID for the named node
    async fn instance_id(&self, node_name: &str) -> Result<String>;

    async fn instance_type(&self, node_name: &str) -> Result<String>;

    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String>;

    /// Absence is `Ok(false)`, not an error
    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool>;

    /// Node name the local host registers under
    async fn current_node_name(&self, hostname: &str) -> Result<String>;
}

/// Placement queries
#[async_trait]
pub trait ZoneOps: Send + Sync {
    /// Zone of the host the engine runs on
    async fn current_zone(&self) -> Result<Zone>;

    async fn zone_by_provider_id(&self, provider_id: &str) -> Result<Zone>;

    async fn zone_by_node_name(&self, node_name: &str) -> Result<Zone>;
}

/// Load-balancer reconciliation, invoked once per service-change event.
/// The host serializes concurrent calls for the same service.
#[async_trait]
pub trait LoadBalancerOps: Send + Sync {
    /// Deterministic logical name for the service's balancer
    fn load_balancer_name(&self, service: &ServiceSpec) -> String;

    /// `Ok(None)` when no balancer exists for the service
    async fn get_load_balancer(&self, service: &ServiceSpec)
        -> Result<Option<LoadBalancerStatus>>;

    /// Create or converge the service's balancer and return its
    /// public address
    async fn ensure_load_balancer(
        &self,
        service: &ServiceSpec,
        nodes: &[NodeRecord],
    ) -> Result<LoadBalancerStatus>;

    /// Converge an existing balancer onto the desired ports and nodes
    async fn update_load_balancer(
        &self,
        service: &ServiceSpec,
        nodes: &[NodeRecord],
    ) -> Result<()>;

    /// Delete the service's balancer; success when already absent
    async fn ensure_load_balancer_deleted(&self, service: &ServiceSpec) -> Result<()>;
}

/// Factory producing a configured facade from an opaque config payload
pub type CloudFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Cloud>> + Send + Sync>;

/// Name-keyed registry of provider factories.
///
/// The host registers every adapter it links at startup and builds the
/// one named by its configuration.
#[derive(Default)]
pub struct CloudRegistry {
    factories: HashMap<String, CloudFactory>,
}

impl CloudRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: CloudFactory) {
        let name = name.into();
        tracing::debug!("Registering cloud provider: {name}");
        self.factories.insert(name, factory);
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, name: &str, config: &serde_json::Value) -> Result<Arc<dyn Cloud>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            CloudError::Unsupported(format!("no cloud provider registered as {name:?}"))
        })?;
        factory(config)
    }
}
