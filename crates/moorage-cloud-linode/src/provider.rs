//! Linode cloud facade
//!
//! Wires the generic engine to the Linode API client. NodeBalancer
//! sub-resources are addressed by nested paths, so port-config and
//! backend IDs handed to the engine are composite,
//! `<balancer>/<config>` and `<balancer>/<config>/<node>`.

use crate::client::{ConfigPayload, InstanceInfo, LinodeApi, NodePayload};
use crate::error::{LinodeError, Result};
use async_trait::async_trait;
use moorage_cloud::{
    Backend, Cloud, CloudError, CloudRegistry, ComputeApi, Instance, InstanceOps,
    InstanceResolver, LbReconciler, LoadBalancer, LoadBalancerApi, LoadBalancerOps, PortConfig,
    PortPolicy, ProviderIdCodec, ZoneOps, ZoneResolver,
};
use serde::Deserialize;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "linode";

const BACKEND_WEIGHT: u32 = 100;
const BACKEND_MODE: &str = "accept";

/// Credentials and placement for one Linode facade
#[derive(Debug, Clone, Deserialize)]
pub struct LinodeConfig {
    pub token: String,

    /// Region new NodeBalancers are allocated in; also reported as the
    /// local zone.
    pub region: String,
}

impl LinodeConfig {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("LINODE_TOKEN")
            .map_err(|_| LinodeError::MissingEnvVar("LINODE_TOKEN".to_string()))?;
        let region = std::env::var("LINODE_REGION")
            .map_err(|_| LinodeError::MissingEnvVar("LINODE_REGION".to_string()))?;
        Ok(Self { token, region })
    }
}

/// Linode provider facade
pub struct LinodeCloud {
    instances: InstanceResolver<Arc<LinodeApi>>,
    zones: ZoneResolver<Arc<LinodeApi>>,
    load_balancers: LbReconciler<Arc<LinodeApi>>,
}

impl LinodeCloud {
    pub fn new(config: LinodeConfig) -> Self {
        Self::with_api(Arc::new(LinodeApi::new(config.token)), config.region)
    }

    pub fn with_api(api: Arc<LinodeApi>, region: String) -> Self {
        let codec = ProviderIdCodec::new(PROVIDER_NAME);
        Self {
            instances: InstanceResolver::new(api.clone(), codec),
            zones: ZoneResolver::new(api.clone(), codec).with_static_region(region.clone()),
            load_balancers: LbReconciler::new(api, region),
        }
    }

    /// Register this provider with the host's registry
    pub fn register(registry: &mut CloudRegistry) {
        registry.register(
            PROVIDER_NAME,
            Box::new(|config| {
                let config: LinodeConfig = serde_json::from_value(config.clone())
                    .map_err(|e| CloudError::Validation(format!("linode config: {e}")))?;
                Ok(Arc::new(LinodeCloud::new(config)))
            }),
        );
    }
}

impl Cloud for LinodeCloud {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn instances(&self) -> Option<&dyn InstanceOps> {
        Some(&self.instances)
    }

    fn zones(&self) -> Option<&dyn ZoneOps> {
        Some(&self.zones)
    }

    fn load_balancers(&self) -> Option<&dyn LoadBalancerOps> {
        Some(&self.load_balancers)
    }
}

fn to_instance(info: InstanceInfo) -> Instance {
    Instance {
        id: info.id.to_string(),
        name: info.label.clone(),
        internal_ip: info.private_ip().map(str::to_string),
        external_ip: info.public_ip().map(str::to_string),
        instance_type: info.instance_type.clone(),
        region: info.region.clone(),
        zone: None,
    }
}

fn parse_segment(id: &str, segment: &str) -> Result<i64> {
    segment
        .parse()
        .map_err(|_| LinodeError::MalformedId(id.to_string()))
}

/// `<balancer>/<config>` composite port-config ID
fn split_config_id(id: &str) -> Result<(i64, i64)> {
    match id.split('/').collect::<Vec<_>>().as_slice() {
        [balancer, config] => Ok((parse_segment(id, balancer)?, parse_segment(id, config)?)),
        _ => Err(LinodeError::MalformedId(id.to_string())),
    }
}

/// `<balancer>/<config>/<node>` composite backend ID
fn split_backend_id(id: &str) -> Result<(i64, i64, i64)> {
    match id.split('/').collect::<Vec<_>>().as_slice() {
        [balancer, config, node] => Ok((
            parse_segment(id, balancer)?,
            parse_segment(id, config)?,
            parse_segment(id, node)?,
        )),
        _ => Err(LinodeError::MalformedId(id.to_string())),
    }
}

fn to_payload(policy: &PortPolicy) -> ConfigPayload {
    ConfigPayload {
        port: policy.port,
        protocol: policy.protocol.as_str().to_string(),
        algorithm: policy.algorithm.as_str().to_string(),
        stickiness: policy.stickiness.clone(),
        check: policy.health_check.kind.as_str().to_string(),
        check_interval: policy.health_check.interval,
        check_timeout: policy.health_check.timeout,
        check_attempts: policy.health_check.attempts,
        check_passive: policy.health_check.passive,
        check_path: policy.health_check.path.clone(),
        check_body: policy.health_check.body.clone(),
        ssl_cert: policy.tls.as_ref().map(|t| t.certificate.clone()),
        ssl_key: policy.tls.as_ref().map(|t| t.key.clone()),
    }
}

#[async_trait]
impl ComputeApi for LinodeApi {
    async fn list_instances(&self) -> moorage_cloud::Result<Vec<Instance>> {
        let linodes = self.list_linodes().await?;
        Ok(linodes.into_iter().map(to_instance).collect())
    }

    async fn get_instance(&self, id: &str) -> moorage_cloud::Result<Instance> {
        Ok(to_instance(self.get_linode(id).await?))
    }
}

#[async_trait]
impl LoadBalancerApi for LinodeApi {
    async fn list_load_balancers(&self) -> moorage_cloud::Result<Vec<LoadBalancer>> {
        let balancers = self.list_nodebalancers().await?;
        Ok(balancers
            .into_iter()
            .map(|nb| LoadBalancer {
                id: nb.id.to_string(),
                name: nb.label,
                address: nb.ipv4,
                region: nb.region,
            })
            .collect())
    }

    async fn create_load_balancer(
        &self,
        name: &str,
        region: &str,
    ) -> moorage_cloud::Result<LoadBalancer> {
        let nb = self.create_nodebalancer(name, region).await?;
        Ok(LoadBalancer {
            id: nb.id.to_string(),
            name: nb.label,
            address: nb.ipv4,
            region: nb.region,
        })
    }

    async fn delete_load_balancer(&self, balancer_id: &str) -> moorage_cloud::Result<()> {
        let id = parse_segment(balancer_id, balancer_id)?;
        Ok(self.delete_nodebalancer(id).await?)
    }

    async fn list_port_configs(
        &self,
        balancer_id: &str,
    ) -> moorage_cloud::Result<Vec<PortConfig>> {
        let nb = parse_segment(balancer_id, balancer_id)?;
        let configs = self.list_configs(nb).await?;
        Ok(configs
            .into_iter()
            .map(|c| PortConfig {
                id: format!("{nb}/{}", c.id),
                port: c.port,
                protocol: c.protocol,
            })
            .collect())
    }

    async fn create_port_config(
        &self,
        balancer_id: &str,
        policy: &PortPolicy,
    ) -> moorage_cloud::Result<PortConfig> {
        let nb = parse_segment(balancer_id, balancer_id)?;
        let config = self.create_config(nb, &to_payload(policy)).await?;
        Ok(PortConfig {
            id: format!("{nb}/{}", config.id),
            port: config.port,
            protocol: config.protocol,
        })
    }

    async fn update_port_config(
        &self,
        config_id: &str,
        policy: &PortPolicy,
    ) -> moorage_cloud::Result<()> {
        let (nb, config) = split_config_id(config_id)?;
        self.update_config(nb, config, &to_payload(policy)).await?;
        Ok(())
    }

    async fn delete_port_config(&self, config_id: &str) -> moorage_cloud::Result<()> {
        let (nb, config) = split_config_id(config_id)?;
        Ok(self.delete_config(nb, config).await?)
    }

    async fn list_backends(&self, config_id: &str) -> moorage_cloud::Result<Vec<Backend>> {
        let (nb, config) = split_config_id(config_id)?;
        let nodes = self.list_nodes(nb, config).await?;
        Ok(nodes
            .into_iter()
            .map(|n| Backend {
                id: format!("{nb}/{config}/{}", n.id),
                label: n.label,
                address: n.address,
            })
            .collect())
    }

    async fn create_backend(
        &self,
        config_id: &str,
        label: &str,
        address: &str,
    ) -> moorage_cloud::Result<Backend> {
        let (nb, config) = split_config_id(config_id)?;
        let payload = NodePayload {
            label: label.to_string(),
            address: address.to_string(),
            weight: BACKEND_WEIGHT,
            mode: BACKEND_MODE.to_string(),
        };
        let node = self.create_node(nb, config, &payload).await?;
        Ok(Backend {
            id: format!("{nb}/{config}/{}", node.id),
            label: node.label,
            address: node.address,
        })
    }

    async fn update_backend(&self, backend_id: &str, address: &str) -> moorage_cloud::Result<()> {
        let (nb, config, node) = split_backend_id(backend_id)?;
        self.update_node(nb, config, node, address).await?;
        Ok(())
    }

    async fn delete_backend(&self, backend_id: &str) -> moorage_cloud::Result<()> {
        let (nb, config, node) = split_backend_id(backend_id)?;
        Ok(self.delete_node(nb, config, node).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_ids_round_trip() {
        assert_eq!(split_config_id("12/34").unwrap(), (12, 34));
        assert_eq!(split_backend_id("12/34/56").unwrap(), (12, 34, 56));
    }

    #[test]
    fn composite_ids_reject_garbage() {
        for bad in ["", "12", "12/34/56/78", "a/b", "12/"] {
            assert!(split_config_id(bad).is_err() || split_backend_id(bad).is_err());
        }
        assert!(matches!(
            split_config_id("12/cfg"),
            Err(LinodeError::MalformedId(_))
        ));
    }

    #[test]
    fn instance_mapping_keeps_provider_fields() {
        let info: InstanceInfo = serde_json::from_str(
            r#"{
                "id": 900,
                "label": "worker-1",
                "type": "g6-standard-4",
                "region": "eu-west",
                "ipv4": ["198.51.100.4", "192.168.200.9"]
            }"#,
        )
        .unwrap();
        let instance = to_instance(info);
        assert_eq!(instance.id, "900");
        assert_eq!(instance.name, "worker-1");
        assert_eq!(instance.internal_ip.as_deref(), Some("192.168.200.9"));
        assert_eq!(instance.external_ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(instance.instance_type, "g6-standard-4");
        assert_eq!(instance.region, "eu-west");
    }

    #[test]
    fn payload_carries_tls_and_health_check() {
        use moorage_cloud::{
            Algorithm, HealthCheck, HealthCheckKind, Protocol, TlsMaterial,
        };
        let policy = PortPolicy {
            port: 443,
            node_port: 30443,
            protocol: Protocol::Https,
            algorithm: Algorithm::LeastConn,
            stickiness: "table".to_string(),
            health_check: HealthCheck {
                kind: HealthCheckKind::Http,
                path: Some("/healthz".to_string()),
                body: None,
                interval: 5,
                timeout: 3,
                attempts: 2,
                passive: true,
            },
            tls: Some(TlsMaterial {
                certificate: "CERT".to_string(),
                key: "KEY".to_string(),
            }),
        };
        let payload = to_payload(&policy);
        assert_eq!(payload.protocol, "https");
        assert_eq!(payload.algorithm, "leastconn");
        assert_eq!(payload.check, "http");
        assert_eq!(payload.check_path.as_deref(), Some("/healthz"));
        assert_eq!(payload.ssl_cert.as_deref(), Some("CERT"));
        assert_eq!(payload.ssl_key.as_deref(), Some("KEY"));
    }
}
