//! Linode provider for Moorage
//!
//! Implements the engine's capability traits over the Linode API v4:
//! compute lookups for node resolution, and NodeBalancer management for
//! load-balancer reconciliation.
//!
//! # Example
//!
//! ```ignore
//! use moorage_cloud::Cloud;
//! use moorage_cloud_linode::{LinodeCloud, LinodeConfig};
//!
//! let cloud = LinodeCloud::new(LinodeConfig::from_env()?);
//! let instances = cloud.instances().unwrap();
//! let addresses = instances.node_addresses("worker-1").await?;
//! ```

pub mod client;
pub mod error;
pub mod provider;

pub use client::LinodeApi;
pub use error::{LinodeError, Result};
pub use provider::{LinodeCloud, LinodeConfig, PROVIDER_NAME};
