//! Linode API v4 client
//!
//! Thin typed wrapper over the REST endpoints the engine needs. Listing
//! calls drain the API's page-based pagination before returning.

use crate::error::{LinodeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const LINODE_API_BASE: &str = "https://api.linode.com/v4";

/// Linode API client
pub struct LinodeApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl LinodeApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: LINODE_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint, e.g. a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<T> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND && context.starts_with("/linode/instances") {
            return Err(LinodeError::InstanceNotFound(context.to_string()));
        }
        if !status.is_success() {
            let message = response
                .json::<ApiErrors>()
                .await
                .ok()
                .and_then(|e| e.errors.into_iter().next())
                .map(|e| e.reason)
                .unwrap_or_else(|| format!("request for {context} failed"));
            return Err(LinodeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        self.read_response(response, path).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        self.read_response(response, path).await
    }

    async fn put<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let response = self
            .client
            .put(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        self.read_response(response, path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let _: serde_json::Value = self.read_response(response, path).await?;
        Ok(())
    }

    /// Drain a paginated listing endpoint
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let response: Page<T> = self.get(&format!("{path}?page={page}")).await?;
            items.extend(response.data);
            if page >= response.pages {
                return Ok(items);
            }
            page += 1;
        }
    }

    pub async fn list_linodes(&self) -> Result<Vec<InstanceInfo>> {
        self.get_all("/linode/instances").await
    }

    pub async fn get_linode(&self, id: &str) -> Result<InstanceInfo> {
        self.get(&format!("/linode/instances/{id}")).await
    }

    pub async fn list_nodebalancers(&self) -> Result<Vec<NodeBalancerInfo>> {
        self.get_all("/nodebalancers").await
    }

    pub async fn create_nodebalancer(
        &self,
        label: &str,
        region: &str,
    ) -> Result<NodeBalancerInfo> {
        tracing::debug!("Creating NodeBalancer {label} in {region}");
        self.post(
            "/nodebalancers",
            &serde_json::json!({ "label": label, "region": region }),
        )
        .await
    }

    pub async fn delete_nodebalancer(&self, id: i64) -> Result<()> {
        self.delete(&format!("/nodebalancers/{id}")).await
    }

    pub async fn list_configs(&self, nodebalancer_id: i64) -> Result<Vec<ConfigInfo>> {
        self.get_all(&format!("/nodebalancers/{nodebalancer_id}/configs"))
            .await
    }

    pub async fn create_config(
        &self,
        nodebalancer_id: i64,
        payload: &ConfigPayload,
    ) -> Result<ConfigInfo> {
        self.post(&format!("/nodebalancers/{nodebalancer_id}/configs"), payload)
            .await
    }

    pub async fn update_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        payload: &ConfigPayload,
    ) -> Result<ConfigInfo> {
        self.put(
            &format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}"),
            payload,
        )
        .await
    }

    pub async fn delete_config(&self, nodebalancer_id: i64, config_id: i64) -> Result<()> {
        self.delete(&format!(
            "/nodebalancers/{nodebalancer_id}/configs/{config_id}"
        ))
        .await
    }

    pub async fn list_nodes(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<Vec<NodeInfo>> {
        self.get_all(&format!(
            "/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes"
        ))
        .await
    }

    pub async fn create_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        payload: &NodePayload,
    ) -> Result<NodeInfo> {
        self.post(
            &format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes"),
            payload,
        )
        .await
    }

    pub async fn update_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        node_id: i64,
        address: &str,
    ) -> Result<NodeInfo> {
        self.put(
            &format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes/{node_id}"),
            &serde_json::json!({ "address": address }),
        )
        .await
    }

    pub async fn delete_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        node_id: i64,
    ) -> Result<()> {
        self.delete(&format!(
            "/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes/{node_id}"
        ))
        .await
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiErrors {
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default = "one")]
    pages: u32,
}

fn one() -> u32 {
    1
}

/// A Linode compute instance
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceInfo {
    pub id: i64,
    pub label: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub region: String,
    #[serde(default)]
    pub ipv4: Vec<String>,
}

impl InstanceInfo {
    /// Linode private addresses live in 192.168.128.0/17
    pub fn private_ip(&self) -> Option<&str> {
        self.ipv4
            .iter()
            .map(String::as_str)
            .find(|ip| ip.starts_with("192.168."))
    }

    pub fn public_ip(&self) -> Option<&str> {
        self.ipv4
            .iter()
            .map(String::as_str)
            .find(|ip| !ip.starts_with("192.168."))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeBalancerInfo {
    pub id: i64,
    pub label: String,
    pub region: String,
    /// Public IPv4, allocated at creation and immutable
    pub ipv4: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigInfo {
    pub id: i64,
    pub port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    pub id: i64,
    pub label: String,
    pub address: String,
}

/// Port-config write payload
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPayload {
    pub port: u16,
    pub protocol: String,
    pub algorithm: String,
    pub stickiness: String,
    pub check: String,
    pub check_interval: u32,
    pub check_timeout: u32,
    pub check_attempts: u32,
    pub check_passive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_key: Option<String>,
}

/// Backend-node write payload
#[derive(Debug, Clone, Serialize)]
pub struct NodePayload {
    pub label: String,
    pub address: String,
    pub weight: u32,
    pub mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ip_split() {
        let instance: InstanceInfo = serde_json::from_str(
            r#"{
                "id": 123,
                "label": "node-a",
                "type": "g6-standard-2",
                "region": "us-east",
                "ipv4": ["203.0.113.7", "192.168.129.42"]
            }"#,
        )
        .unwrap();

        assert_eq!(instance.public_ip(), Some("203.0.113.7"));
        assert_eq!(instance.private_ip(), Some("192.168.129.42"));
    }

    #[test]
    fn instance_without_private_ip() {
        let instance: InstanceInfo = serde_json::from_str(
            r#"{"id": 1, "label": "n", "type": "g6-nanode-1", "region": "us-east", "ipv4": ["203.0.113.7"]}"#,
        )
        .unwrap();
        assert_eq!(instance.private_ip(), None);
    }

    #[test]
    fn page_defaults_to_single() {
        let page: Page<InstanceInfo> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn config_payload_skips_absent_tls() {
        let payload = ConfigPayload {
            port: 80,
            protocol: "tcp".to_string(),
            algorithm: "roundrobin".to_string(),
            stickiness: "table".to_string(),
            check: "connection".to_string(),
            check_interval: 5,
            check_timeout: 3,
            check_attempts: 2,
            check_passive: true,
            check_path: None,
            check_body: None,
            ssl_cert: None,
            ssl_key: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("ssl_cert").is_none());
        assert_eq!(json["check"], "connection");
    }
}
