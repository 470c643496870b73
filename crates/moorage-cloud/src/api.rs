//! Provider capability interface
//!
//! Each vendor adapter implements these traits over its own API client;
//! the engine is written once against them. Listing calls are expected
//! to drain the provider's pagination internally and return the full
//! set. Implementations must be safe for concurrent use.

use crate::error::Result;
use crate::spec::PortPolicy;
use crate::types::{Backend, Instance, LoadBalancer, PortConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Compute-resource reads
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Enumerate every compute instance visible to the credentials
    async fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Point lookup by provider-scoped resource ID.
    /// `InstanceNotFound` when the provider reports the resource absent.
    async fn get_instance(&self, id: &str) -> Result<Instance>;
}

/// Load-balancer reads and writes
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>>;

    /// Allocate a balancer in `region`. The public address is assigned
    /// by the provider and never changes afterwards.
    async fn create_load_balancer(&self, name: &str, region: &str) -> Result<LoadBalancer>;

    /// Delete a balancer; the provider cascades to its port configs
    /// and backends.
    async fn delete_load_balancer(&self, balancer_id: &str) -> Result<()>;

    async fn list_port_configs(&self, balancer_id: &str) -> Result<Vec<PortConfig>>;

    async fn create_port_config(
        &self,
        balancer_id: &str,
        policy: &PortPolicy,
    ) -> Result<PortConfig>;

    async fn update_port_config(&self, config_id: &str, policy: &PortPolicy) -> Result<()>;

    async fn delete_port_config(&self, config_id: &str) -> Result<()>;

    async fn list_backends(&self, config_id: &str) -> Result<Vec<Backend>>;

    async fn create_backend(
        &self,
        config_id: &str,
        label: &str,
        address: &str,
    ) -> Result<Backend>;

    async fn update_backend(&self, backend_id: &str, address: &str) -> Result<()>;

    async fn delete_backend(&self, backend_id: &str) -> Result<()>;
}

// Adapters share one client between the resolvers and the reconciler
// behind an Arc.
#[async_trait]
impl<T: ComputeApi + ?Sized> ComputeApi for Arc<T> {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        (**self).list_instances().await
    }

    async fn get_instance(&self, id: &str) -> Result<Instance> {
        (**self).get_instance(id).await
    }
}

#[async_trait]
impl<T: LoadBalancerApi + ?Sized> LoadBalancerApi for Arc<T> {
    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        (**self).list_load_balancers().await
    }

    async fn create_load_balancer(&self, name: &str, region: &str) -> Result<LoadBalancer> {
        (**self).create_load_balancer(name, region).await
    }

    async fn delete_load_balancer(&self, balancer_id: &str) -> Result<()> {
        (**self).delete_load_balancer(balancer_id).await
    }

    async fn list_port_configs(&self, balancer_id: &str) -> Result<Vec<PortConfig>> {
        (**self).list_port_configs(balancer_id).await
    }

    async fn create_port_config(
        &self,
        balancer_id: &str,
        policy: &PortPolicy,
    ) -> Result<PortConfig> {
        (**self).create_port_config(balancer_id, policy).await
    }

    async fn update_port_config(&self, config_id: &str, policy: &PortPolicy) -> Result<()> {
        (**self).update_port_config(config_id, policy).await
    }

    async fn delete_port_config(&self, config_id: &str) -> Result<()> {
        (**self).delete_port_config(config_id).await
    }

    async fn list_backends(&self, config_id: &str) -> Result<Vec<Backend>> {
        (**self).list_backends(config_id).await
    }

    async fn create_backend(
        &self,
        config_id: &str,
        label: &str,
        address: &str,
    ) -> Result<Backend> {
        (**self).create_backend(config_id, label, address).await
    }

    async fn update_backend(&self, backend_id: &str, address: &str) -> Result<()> {
        (**self).update_backend(backend_id, address).await
    }

    async fn delete_backend(&self, backend_id: &str) -> Result<()> {
        (**self).delete_backend(backend_id).await
    }
}

