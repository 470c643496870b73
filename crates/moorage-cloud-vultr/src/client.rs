//! Vultr API v2 client

use crate::error::{Result, VultrError};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const VULTR_API_BASE: &str = "https://api.vultr.com/v2";

/// Vultr API client
pub struct VultrApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl VultrApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: VULTR_API_BASE.to_string(),
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
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(VultrError::InstanceNotFound(path_and_query.to_string()));
        }
        if !status.is_success() {
            let message = response
                .json::<ApiError>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("request for {path_and_query} failed"));
            return Err(VultrError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// List every instance, following the cursor-based pagination
    pub async fn list_servers(&self) -> Result<Vec<ServerInfo>> {
        let mut servers = Vec::new();
        let mut cursor = String::new();
        loop {
            let path = if cursor.is_empty() {
                "/instances".to_string()
            } else {
                format!("/instances?cursor={cursor}")
            };
            let page: InstanceListResponse = self.get(&path).await?;
            servers.extend(page.instances);
            match page.meta.links.next {
                Some(next) if !next.is_empty() => cursor = next,
                _ => {
                    tracing::debug!("Listed {} Vultr instances", servers.len());
                    return Ok(servers);
                }
            }
        }
    }

    pub async fn get_server(&self, id: &str) -> Result<ServerInfo> {
        let response: InstanceResponse = self.get(&format!("/instances/{id}")).await?;
        Ok(response.instance)
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct InstanceListResponse {
    instances: Vec<ServerInfo>,
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct InstanceResponse {
    instance: ServerInfo,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    next: Option<String>,
}

/// A Vultr compute instance
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub label: String,
    pub region: String,
    pub plan: String,
    #[serde(default)]
    pub main_ip: String,
    #[serde(default)]
    pub internal_ip: String,
}

impl ServerInfo {
    /// Empty and all-zero addresses read as absent
    pub fn public_ip(&self) -> Option<&str> {
        present_ip(&self.main_ip)
    }

    pub fn private_ip(&self) -> Option<&str> {
        present_ip(&self.internal_ip)
    }
}

fn present_ip(ip: &str) -> Option<&str> {
    if ip.is_empty() || ip == "0.0.0.0" {
        None
    } else {
        Some(ip)
    }
}
