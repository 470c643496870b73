//! Equinix Metal API client
//!
//! Device listings are project-scoped; the project ID is part of the
//! client because every credential is issued against one project.

use crate::error::{PacketError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const PACKET_API_BASE: &str = "https://api.equinix.com/metal/v1";

/// Equinix Metal API client
pub struct PacketApi {
    client: reqwest::Client,
    token: String,
    project_id: String,
    base_url: String,
}

impl PacketApi {
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            project_id: project_id.into(),
            base_url: PACKET_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{path_and_query}", self.base_url))
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PacketError::DeviceNotFound(path_and_query.to_string()));
        }
        if !status.is_success() {
            return Err(PacketError::Api {
                status: status.as_u16(),
                message: format!("request for {path_and_query} failed"),
            });
        }
        Ok(response.json().await?)
    }

    /// List every device in the project, draining pagination
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("/projects/{}/devices?page={page}", self.project_id);
            let response: DeviceListResponse = self.get(&path).await?;
            let fetched = response.devices.len();
            devices.extend(response.devices);
            if response.meta.next.is_none() || fetched == 0 {
                tracing::debug!("Listed {} devices in project {}", devices.len(), self.project_id);
                return Ok(devices);
            }
            page += 1;
        }
    }

    pub async fn get_device(&self, id: &str) -> Result<DeviceInfo> {
        self.get(&format!("/devices/{id}")).await
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct DeviceListResponse {
    devices: Vec<DeviceInfo>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    next: Option<serde_json::Value>,
}

/// An Equinix Metal device
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub hostname: String,
    pub plan: Plan,
    pub facility: Facility,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Facility {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpAddress {
    pub address: String,
    pub public: bool,
    pub address_family: u8,
}

impl DeviceInfo {
    pub fn public_ipv4(&self) -> Option<&str> {
        self.ip_addresses
            .iter()
            .find(|ip| ip.public && ip.address_family == 4)
            .map(|ip| ip.address.as_str())
    }

    pub fn private_ipv4(&self) -> Option<&str> {
        self.ip_addresses
            .iter()
            .find(|ip| !ip.public && ip.address_family == 4)
            .map(|ip| ip.address.as_str())
    }
}
