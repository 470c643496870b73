//! Packet (Equinix Metal) provider for Moorage
//!
//! Project-scoped device compute with facility-based zones. Packet has
//! no managed load balancer, so that surface is absent from the facade.

pub mod client;
pub mod error;
pub mod provider;

pub use client::PacketApi;
pub use error::{PacketError, Result};
pub use provider::{PROVIDER_NAME, PacketCloud, PacketConfig};
