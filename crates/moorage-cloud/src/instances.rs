//! Instance resolution
//!
//! Maps a node's name or provider ID to the concrete compute resource
//! behind it. Every lookup hits the provider; correctness degrades to
//! the remote API's own consistency guarantees.

use crate::api::ComputeApi;
use crate::cloud::InstanceOps;
use crate::error::{CloudError, Result};
use crate::provider_id::ProviderIdCodec;
use crate::types::{Instance, NodeAddresses};
use async_trait::async_trait;

/// Generic instance resolver over one provider's compute API
pub struct InstanceResolver<C> {
    compute: C,
    codec: ProviderIdCodec,
}

impl<C: ComputeApi> InstanceResolver<C> {
    pub fn new(compute: C, codec: ProviderIdCodec) -> Self {
        Self { compute, codec }
    }

    pub fn codec(&self) -> &ProviderIdCodec {
        &self.codec
    }

    /// Scan the full listing for an exact display-name match
    pub async fn resolve_by_name(&self, name: &str) -> Result<Instance> {
        let instances = self.compute.list_instances().await?;
        instances
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| CloudError::InstanceNotFound(name.to_string()))
    }

    pub async fn resolve_by_provider_id(&self, provider_id: &str) -> Result<Instance> {
        let id = self.codec.decode(provider_id)?;
        self.compute.get_instance(id).await
    }

    /// Routing needs both IPs; a half-addressed instance is an error,
    /// not a partial answer.
    pub fn addresses(&self, instance: &Instance) -> Result<NodeAddresses> {
        let internal_ip = instance.internal_ip.clone().ok_or_else(|| {
            CloudError::AddressUnavailable(instance.name.clone(), "no internal IP".to_string())
        })?;
        let external_ip = instance.external_ip.clone().ok_or_else(|| {
            CloudError::AddressUnavailable(instance.name.clone(), "no external IP".to_string())
        })?;
        Ok(NodeAddresses {
            hostname: instance.name.clone(),
            internal_ip,
            external_ip,
        })
    }
}

#[async_trait]
impl<C: ComputeApi> InstanceOps for InstanceResolver<C> {
    async fn node_addresses(&self, node_name: &str) -> Result<NodeAddresses> {
        let instance = self.resolve_by_name(node_name).await?;
        self.addresses(&instance)
    }

    async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<NodeAddresses> {
        let instance = self.resolve_by_provider_id(provider_id).await?;
        self.addresses(&instance)
    }

    async fn instance_id(&self, node_name: &str) -> Result<String> {
        let instance = self.resolve_by_name(node_name).await?;
        Ok(instance.id)
    }

    async fn instance_type(&self, node_name: &str) -> Result<String> {
        let instance = self.resolve_by_name(node_name).await?;
        Ok(instance.instance_type)
    }

    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String> {
        let instance = self.resolve_by_provider_id(provider_id).await?;
        Ok(instance.instance_type)
    }

    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        match self.resolve_by_provider_id(provider_id).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn current_node_name(&self, hostname: &str) -> Result<String> {
        Ok(hostname.to_string())
    }
}
