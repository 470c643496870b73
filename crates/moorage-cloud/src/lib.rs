//! Moorage cloud provider engine
//!
//! Provider-neutral node and load-balancer reconciliation for a cluster
//! control plane. The engine resolves node identities to remote compute
//! resources and converges each service's load balancer onto its desired
//! spec; vendor crates only supply an API client implementing the
//! capability traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              control-plane host                  │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Cloud / InstanceOps / ZoneOps / LoadBalancerOps
//! ┌─────────────────▼───────────────────────────────┐
//! │                moorage-cloud                     │
//! │  ┌──────────────┐ ┌──────────────┐              │
//! │  │  resolvers   │ │  reconciler  │              │
//! │  └──────────────┘ └──────────────┘              │
//! │         ComputeApi / LoadBalancerApi             │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │    linode     │ │ vultr, packet │
//! │    adapter    │ │   adapters    │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Reconciliation is driven externally: the host invokes the operations
//! synchronously, once per service-change event, and serializes calls
//! for the same service. The engine keeps no state between calls.

pub mod annotations;
pub mod api;
pub mod cloud;
pub mod error;
pub mod instances;
pub mod provider_id;
pub mod reconciler;
pub mod spec;
pub mod types;
pub mod zones;

// Re-exports
pub use api::{ComputeApi, LoadBalancerApi};
pub use cloud::{
    Cloud, CloudFactory, CloudRegistry, InstanceOps, LoadBalancerOps, ZoneOps,
};
pub use error::{CloudError, Result};
pub use instances::InstanceResolver;
pub use provider_id::ProviderIdCodec;
pub use reconciler::LbReconciler;
pub use spec::{
    Algorithm, DesiredLbSpec, HealthCheck, HealthCheckKind, LbSpecBuilder, PortPolicy,
    Protocol, TlsMaterial, load_balancer_name,
};
pub use types::{
    Backend, Instance, LoadBalancer, LoadBalancerStatus, NodeAddresses, NodeRecord,
    PortConfig, ServicePort, ServiceSpec, Zone,
};
pub use zones::{MetadataZoneSource, ZoneResolver, az_to_region};
