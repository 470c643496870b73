//! Shared data model for the engine and its adapters
//!
//! Remote-owned resources (`Instance`, `LoadBalancer`, `PortConfig`,
//! `Backend`) are read fresh from the provider on every call and never
//! cached in-process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A remote compute resource backing a cluster node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Provider-scoped resource ID
    pub id: String,

    /// Display name; matched exactly against the node name
    pub name: String,

    pub internal_ip: Option<String>,
    pub external_ip: Option<String>,

    /// Instance type / plan / SKU
    pub instance_type: String,

    pub region: String,

    /// Failure domain within the region, when the provider exposes one
    pub zone: Option<String>,
}

/// The address bundle required for routing to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddresses {
    pub hostname: String,
    pub internal_ip: String,
    pub external_ip: String,
}

/// A cluster node as handed to the engine by the host
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Node name as known to the control plane; used as backend label
    pub name: String,

    pub internal_ip: Option<String>,
}

impl NodeRecord {
    pub fn new(name: impl Into<String>, internal_ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal_ip: Some(internal_ip.into()),
        }
    }

    /// Backend address for this node, `internal_ip:node_port`
    pub fn backend_address(&self, node_port: u16) -> String {
        format!(
            "{}:{}",
            self.internal_ip.as_deref().unwrap_or_default(),
            node_port
        )
    }
}

/// Region / failure-domain placement of an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub region: String,
    pub failure_domain: String,
}

impl Zone {
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            failure_domain: String::new(),
        }
    }
}

/// A routed service as handed to the engine by the host
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    /// Cluster-scoped unique identifier; the load-balancer name is
    /// derived from it
    pub uid: String,

    pub ports: Vec<ServicePort>,

    /// String-keyed configuration surface; unrecognized keys are ignored
    pub annotations: BTreeMap<String, String>,
}

impl ServiceSpec {
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// One exposed port of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePort {
    /// Front-facing load-balancer port
    pub port: u16,

    /// Port the backends listen on
    pub node_port: u16,
}

/// A remote load balancer, as listed by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: String,

    /// Logical name; matched against the name derived from the service UID
    pub name: String,

    /// Public address, immutable once allocated
    pub address: String,

    pub region: String,
}

/// Public endpoint of a provisioned load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerStatus {
    pub address: String,
}

/// A load balancer's per-port policy bundle, as held remotely
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    pub id: String,
    pub port: u16,
    pub protocol: String,
}

/// A load balancer's registered backend target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backend {
    pub id: String,

    /// Node name this backend was registered for
    pub label: String,

    /// `ip:port` the traffic is forwarded to
    pub address: String,
}
