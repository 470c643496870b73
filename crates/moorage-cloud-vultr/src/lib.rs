//! Vultr provider for Moorage
//!
//! Compute and zone resolution over the Vultr API v2. Load balancing is
//! not offered by this adapter; the facade exposes no load-balancer
//! surface.

pub mod client;
pub mod error;
pub mod provider;

pub use client::VultrApi;
pub use error::{Result, VultrError};
pub use provider::{PROVIDER_NAME, VultrCloud, VultrConfig};
