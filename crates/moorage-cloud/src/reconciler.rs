//! Load-balancer reconciliation
//!
//! One pass reads the remote state fresh, diffs it against the desired
//! spec keyed by port number and backend label, and issues the minimal
//! create/delete set. Matched ports and surviving backends are always
//! updated in place; the extra remote calls buy an implementation that
//! is idempotent without tracking remote versions. The first failed
//! call aborts the pass and the next pass is expected to converge.

use crate::api::LoadBalancerApi;
use crate::cloud::LoadBalancerOps;
use crate::error::{CloudError, Result};
use crate::spec::{DesiredLbSpec, LbSpecBuilder, PortPolicy, load_balancer_name};
use crate::types::{LoadBalancer, LoadBalancerStatus, NodeRecord, ServiceSpec};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Generic reconciler over one provider's load-balancer API
pub struct LbReconciler<A> {
    api: A,

    /// Placement argument for newly allocated balancers
    region: String,

    builder: LbSpecBuilder,
}

impl<A: LoadBalancerApi> LbReconciler<A> {
    pub fn new(api: A, region: impl Into<String>) -> Self {
        Self {
            api,
            region: region.into(),
            builder: LbSpecBuilder::new(),
        }
    }

    pub fn with_spec_builder(mut self, builder: LbSpecBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Match the listing by logical name; absence is not an error
    async fn balancer_by_name(&self, name: &str) -> Result<Option<LoadBalancer>> {
        let balancers = self.api.list_load_balancers().await?;
        Ok(balancers.into_iter().find(|lb| lb.name == name))
    }

    /// Allocate a balancer and populate it from scratch
    async fn create(&self, desired: &DesiredLbSpec, nodes: &[NodeRecord]) -> Result<String> {
        tracing::info!("Creating load balancer {} in {}", desired.name, self.region);
        let lb = self
            .api
            .create_load_balancer(&desired.name, &self.region)
            .await?;

        for policy in &desired.ports {
            let config = self.api.create_port_config(&lb.id, policy).await?;
            self.create_backends(&config.id, policy, nodes).await?;
        }

        Ok(lb.address)
    }

    async fn create_backends(
        &self,
        config_id: &str,
        policy: &PortPolicy,
        nodes: &[NodeRecord],
    ) -> Result<()> {
        for node in nodes {
            self.api
                .create_backend(config_id, &node.name, &node.backend_address(policy.node_port))
                .await?;
        }
        Ok(())
    }

    /// Converge an existing balancer's port configs and backends
    async fn sync(
        &self,
        lb: &LoadBalancer,
        desired: &DesiredLbSpec,
        nodes: &[NodeRecord],
    ) -> Result<()> {
        let actual = self.api.list_port_configs(&lb.id).await?;

        let desired_ports: BTreeMap<u16, &PortPolicy> =
            desired.ports.iter().map(|p| (p.port, p)).collect();
        let actual_ports: BTreeMap<u16, _> = actual.iter().map(|c| (c.port, c)).collect();

        for (port, config) in &actual_ports {
            if !desired_ports.contains_key(port) {
                tracing::info!("Deleting port config {port} of {}", desired.name);
                self.api.delete_port_config(&config.id).await?;
            }
        }

        for (port, policy) in &desired_ports {
            match actual_ports.get(port) {
                Some(config) => {
                    self.api.update_port_config(&config.id, policy).await?;
                    self.sync_backends(&config.id, policy, nodes).await?;
                }
                None => {
                    tracing::info!("Creating port config {port} of {}", desired.name);
                    let config = self.api.create_port_config(&lb.id, policy).await?;
                    self.create_backends(&config.id, policy, nodes).await?;
                }
            }
        }

        Ok(())
    }

    /// Two-way backend diff keyed by node label. Survivors are updated
    /// to the node's current `internal_ip:node_port`, covering node IP
    /// churn.
    async fn sync_backends(
        &self,
        config_id: &str,
        policy: &PortPolicy,
        nodes: &[NodeRecord],
    ) -> Result<()> {
        let backends = self.api.list_backends(config_id).await?;

        let nodes_by_name: BTreeMap<&str, &NodeRecord> =
            nodes.iter().map(|n| (n.name.as_str(), n)).collect();
        let backends_by_label: BTreeMap<&str, _> =
            backends.iter().map(|b| (b.label.as_str(), b)).collect();

        for (label, backend) in &backends_by_label {
            match nodes_by_name.get(label) {
                Some(node) => {
                    self.api
                        .update_backend(&backend.id, &node.backend_address(policy.node_port))
                        .await?;
                }
                None => {
                    tracing::info!("Deleting backend {label} from port {}", policy.port);
                    self.api.delete_backend(&backend.id).await?;
                }
            }
        }

        for (name, node) in &nodes_by_name {
            if !backends_by_label.contains_key(name) {
                tracing::info!("Creating backend {name} on port {}", policy.port);
                self.api
                    .create_backend(config_id, name, &node.backend_address(policy.node_port))
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<A: LoadBalancerApi> LoadBalancerOps for LbReconciler<A> {
    fn load_balancer_name(&self, service: &ServiceSpec) -> String {
        load_balancer_name(&service.uid)
    }

    async fn get_load_balancer(
        &self,
        service: &ServiceSpec,
    ) -> Result<Option<LoadBalancerStatus>> {
        let name = self.load_balancer_name(service);
        Ok(self
            .balancer_by_name(&name)
            .await?
            .map(|lb| LoadBalancerStatus {
                address: lb.address,
            }))
    }

    async fn ensure_load_balancer(
        &self,
        service: &ServiceSpec,
        nodes: &[NodeRecord],
    ) -> Result<LoadBalancerStatus> {
        let desired = self.builder.build(service)?;

        match self.balancer_by_name(&desired.name).await? {
            None => {
                let address = self.create(&desired, nodes).await?;
                Ok(LoadBalancerStatus { address })
            }
            Some(lb) => {
                self.sync(&lb, &desired, nodes).await?;
                // the public address is immutable once allocated
                let refreshed = self.balancer_by_name(&desired.name).await?.ok_or_else(
                    || CloudError::LoadBalancerNotFound(desired.name.clone()),
                )?;
                Ok(LoadBalancerStatus {
                    address: refreshed.address,
                })
            }
        }
    }

    async fn update_load_balancer(
        &self,
        service: &ServiceSpec,
        nodes: &[NodeRecord],
    ) -> Result<()> {
        let desired = self.builder.build(service)?;
        let lb = self
            .balancer_by_name(&desired.name)
            .await?
            .ok_or_else(|| CloudError::LoadBalancerNotFound(desired.name.clone()))?;
        self.sync(&lb, &desired, nodes).await
    }

    async fn ensure_load_balancer_deleted(&self, service: &ServiceSpec) -> Result<()> {
        let name = self.load_balancer_name(service);
        match self.balancer_by_name(&name).await? {
            None => Ok(()),
            Some(lb) => {
                tracing::info!("Deleting load balancer {name}");
                self.api.delete_load_balancer(&lb.id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Backend, PortConfig, ServicePort};
    use std::collections::BTreeMap as Map;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeState {
        balancers: Vec<LoadBalancer>,
        configs: Vec<(String, PortConfig)>,   // (balancer_id, config)
        backends: Vec<(String, Backend)>,     // (config_id, backend)
        ops: Vec<String>,
        next_id: u32,
    }

    impl FakeState {
        fn next(&mut self, prefix: &str) -> String {
            self.next_id += 1;
            format!("{prefix}-{}", self.next_id)
        }
    }

    #[derive(Default)]
    struct FakeLb {
        state: Mutex<FakeState>,
    }

    impl FakeLb {
        fn ops(&self) -> Vec<String> {
            self.state.lock().unwrap().ops.clone()
        }

        fn seed_balancer(&self, name: &str, ports: &[u16]) -> String {
            let mut s = self.state.lock().unwrap();
            let lb_id = s.next("lb");
            s.balancers.push(LoadBalancer {
                id: lb_id.clone(),
                name: name.to_string(),
                address: "203.0.113.10".to_string(),
                region: "us-east".to_string(),
            });
            for &port in ports {
                let id = s.next("cfg");
                s.configs.push((
                    lb_id.clone(),
                    PortConfig {
                        id,
                        port,
                        protocol: "tcp".to_string(),
                    },
                ));
            }
            lb_id
        }

        fn seed_backend(&self, port: u16, label: &str, address: &str) {
            let mut s = self.state.lock().unwrap();
            let config_id = s
                .configs
                .iter()
                .find(|(_, c)| c.port == port)
                .map(|(_, c)| c.id.clone())
                .unwrap();
            let id = s.next("be");
            s.backends.push((
                config_id,
                Backend {
                    id,
                    label: label.to_string(),
                    address: address.to_string(),
                },
            ));
        }

        /// port -> {label -> address}
        fn backend_view(&self) -> Map<u16, Map<String, String>> {
            let s = self.state.lock().unwrap();
            let mut view = Map::new();
            for (_, config) in &s.configs {
                let mut members = Map::new();
                for (config_id, backend) in &s.backends {
                    if *config_id == config.id {
                        members.insert(backend.label.clone(), backend.address.clone());
                    }
                }
                view.insert(config.port, members);
            }
            view
        }
    }

    #[async_trait]
    impl LoadBalancerApi for FakeLb {
        async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
            Ok(self.state.lock().unwrap().balancers.clone())
        }

        async fn create_load_balancer(&self, name: &str, region: &str) -> Result<LoadBalancer> {
            let mut s = self.state.lock().unwrap();
            let id = s.next("lb");
            let lb = LoadBalancer {
                id,
                name: name.to_string(),
                address: "203.0.113.10".to_string(),
                region: region.to_string(),
            };
            s.balancers.push(lb.clone());
            s.ops.push(format!("create-lb:{name}"));
            Ok(lb)
        }

        async fn delete_load_balancer(&self, balancer_id: &str) -> Result<()> {
            let mut s = self.state.lock().unwrap();
            s.balancers.retain(|lb| lb.id != balancer_id);
            s.configs.retain(|(owner, _)| owner != balancer_id);
            s.ops.push(format!("delete-lb:{balancer_id}"));
            Ok(())
        }

        async fn list_port_configs(&self, balancer_id: &str) -> Result<Vec<PortConfig>> {
            let s = self.state.lock().unwrap();
            Ok(s.configs
                .iter()
                .filter(|(owner, _)| owner == balancer_id)
                .map(|(_, c)| c.clone())
                .collect())
        }

        async fn create_port_config(
            &self,
            balancer_id: &str,
            policy: &PortPolicy,
        ) -> Result<PortConfig> {
            let mut s = self.state.lock().unwrap();
            let id = s.next("cfg");
            let config = PortConfig {
                id,
                port: policy.port,
                protocol: policy.protocol.as_str().to_string(),
            };
            s.configs.push((balancer_id.to_string(), config.clone()));
            s.ops.push(format!("create-config:{}", policy.port));
            Ok(config)
        }

        async fn update_port_config(&self, config_id: &str, policy: &PortPolicy) -> Result<()> {
            let mut guard = self.state.lock().unwrap();
            let s = &mut *guard;
            let config = s
                .configs
                .iter_mut()
                .find(|(_, c)| c.id == config_id)
                .map(|(_, c)| c)
                .ok_or_else(|| CloudError::LoadBalancerNotFound(config_id.to_string()))?;
            config.protocol = policy.protocol.as_str().to_string();
            s.ops.push(format!("update-config:{}", policy.port));
            Ok(())
        }

        async fn delete_port_config(&self, config_id: &str) -> Result<()> {
            let mut s = self.state.lock().unwrap();
            let port = s
                .configs
                .iter()
                .find(|(_, c)| c.id == config_id)
                .map(|(_, c)| c.port)
                .unwrap_or_default();
            s.configs.retain(|(_, c)| c.id != config_id);
            s.backends.retain(|(owner, _)| owner != config_id);
            s.ops.push(format!("delete-config:{port}"));
            Ok(())
        }

        async fn list_backends(&self, config_id: &str) -> Result<Vec<Backend>> {
            let s = self.state.lock().unwrap();
            Ok(s.backends
                .iter()
                .filter(|(owner, _)| owner == config_id)
                .map(|(_, b)| b.clone())
                .collect())
        }

        async fn create_backend(
            &self,
            config_id: &str,
            label: &str,
            address: &str,
        ) -> Result<Backend> {
            let mut s = self.state.lock().unwrap();
            let id = s.next("be");
            let backend = Backend {
                id,
                label: label.to_string(),
                address: address.to_string(),
            };
            s.backends.push((config_id.to_string(), backend.clone()));
            s.ops.push(format!("create-backend:{label}"));
            Ok(backend)
        }

        async fn update_backend(&self, backend_id: &str, address: &str) -> Result<()> {
            let mut guard = self.state.lock().unwrap();
            let s = &mut *guard;
            let (label, entry) = s
                .backends
                .iter_mut()
                .find(|(_, b)| b.id == backend_id)
                .map(|(_, b)| (b.label.clone(), b))
                .ok_or_else(|| CloudError::LoadBalancerNotFound(backend_id.to_string()))?;
            entry.address = address.to_string();
            s.ops.push(format!("update-backend:{label}"));
            Ok(())
        }

        async fn delete_backend(&self, backend_id: &str) -> Result<()> {
            let mut s = self.state.lock().unwrap();
            let label = s
                .backends
                .iter()
                .find(|(_, b)| b.id == backend_id)
                .map(|(_, b)| b.label.clone())
                .unwrap_or_default();
            s.backends.retain(|(_, b)| b.id != backend_id);
            s.ops.push(format!("delete-backend:{label}"));
            Ok(())
        }
    }

    fn service(uid: &str, ports: &[(u16, u16)]) -> ServiceSpec {
        ServiceSpec {
            uid: uid.to_string(),
            ports: ports
                .iter()
                .map(|&(port, node_port)| ServicePort { port, node_port })
                .collect(),
            annotations: Default::default(),
        }
    }

    fn nodes(specs: &[(&str, &str)]) -> Vec<NodeRecord> {
        specs
            .iter()
            .map(|&(name, ip)| NodeRecord::new(name, ip))
            .collect()
    }

    fn reconciler(api: &std::sync::Arc<FakeLb>) -> LbReconciler<std::sync::Arc<FakeLb>> {
        LbReconciler::new(api.clone(), "us-east")
    }

    #[tokio::test]
    async fn ensure_creates_everything_when_absent() {
        let api = std::sync::Arc::new(FakeLb::default());
        let svc = service("uid-1", &[(80, 30080), (443, 30443)]);
        let nodes = nodes(&[("node-1", "10.0.0.1"), ("node-2", "10.0.0.2")]);

        let status = reconciler(&api)
            .ensure_load_balancer(&svc, &nodes)
            .await
            .unwrap();
        assert_eq!(status.address, "203.0.113.10");

        let view = api.backend_view();
        assert_eq!(view.keys().copied().collect::<Vec<_>>(), vec![80, 443]);
        assert_eq!(view[&80]["node-1"], "10.0.0.1:30080");
        assert_eq!(view[&443]["node-2"], "10.0.0.2:30443");
    }

    #[tokio::test]
    async fn ensure_on_existing_updates_and_returns_same_address() {
        let api = std::sync::Arc::new(FakeLb::default());
        let svc = service("uid-1", &[(80, 30080)]);
        let name = load_balancer_name("uid-1");
        api.seed_balancer(&name, &[80]);

        let r = reconciler(&api);
        let status = r
            .ensure_load_balancer(&svc, &nodes(&[("node-1", "10.0.0.1")]))
            .await
            .unwrap();
        assert_eq!(status.address, "203.0.113.10");
        assert!(api.ops().iter().all(|op| !op.starts_with("create-lb")));
    }

    #[tokio::test]
    async fn update_diffs_ports_by_exact_number() {
        // actual {80, 443}, desired {443, 8080}
        let api = std::sync::Arc::new(FakeLb::default());
        let name = load_balancer_name("uid-1");
        api.seed_balancer(&name, &[80, 443]);

        let svc = service("uid-1", &[(443, 30443), (8080, 30880)]);
        reconciler(&api)
            .update_load_balancer(&svc, &nodes(&[]))
            .await
            .unwrap();

        let ops = api.ops();
        assert!(ops.contains(&"delete-config:80".to_string()));
        assert!(ops.contains(&"update-config:443".to_string()));
        assert!(ops.contains(&"create-config:8080".to_string()));
        assert!(!ops.contains(&"update-config:8080".to_string()));
    }

    #[tokio::test]
    async fn update_diffs_backends_by_exact_label() {
        let api = std::sync::Arc::new(FakeLb::default());
        let name = load_balancer_name("uid-1");
        api.seed_balancer(&name, &[80]);
        api.seed_backend(80, "node-1", "10.0.9.9:30080"); // stale IP
        api.seed_backend(80, "node-4", "10.0.0.4:30080");

        let svc = service("uid-1", &[(80, 30080)]);
        let current = nodes(&[
            ("node-1", "10.0.0.1"),
            ("node-2", "10.0.0.2"),
            ("node-3", "10.0.0.3"),
        ]);
        reconciler(&api)
            .update_load_balancer(&svc, &current)
            .await
            .unwrap();

        let ops = api.ops();
        assert!(ops.contains(&"delete-backend:node-4".to_string()));
        assert!(ops.contains(&"update-backend:node-1".to_string()));
        assert!(ops.contains(&"create-backend:node-2".to_string()));
        assert!(ops.contains(&"create-backend:node-3".to_string()));

        let view = api.backend_view();
        assert_eq!(view[&80]["node-1"], "10.0.0.1:30080");
        assert!(!view[&80].contains_key("node-4"));
    }

    #[tokio::test]
    async fn update_twice_converges_to_the_same_state() {
        let api = std::sync::Arc::new(FakeLb::default());
        let name = load_balancer_name("uid-1");
        api.seed_balancer(&name, &[80, 443]);
        api.seed_backend(80, "node-4", "10.0.0.4:30080");

        let svc = service("uid-1", &[(443, 30443), (8080, 30880)]);
        let current = nodes(&[("node-1", "10.0.0.1")]);
        let r = reconciler(&api);

        r.update_load_balancer(&svc, &current).await.unwrap();
        let first = api.backend_view();

        r.update_load_balancer(&svc, &current).await.unwrap();
        let second = api.backend_view();
        assert_eq!(first, second);

        // the second pass still issues updates but never mutates shape
        let ops = api.ops();
        let creates = ops.iter().filter(|op| op.starts_with("create-config")).count();
        let deletes = ops.iter().filter(|op| op.starts_with("delete-config")).count();
        assert_eq!(creates, 1);
        assert_eq!(deletes, 1);
    }

    #[tokio::test]
    async fn update_without_balancer_is_not_found() {
        let api = std::sync::Arc::new(FakeLb::default());
        let svc = service("uid-1", &[(80, 30080)]);
        assert!(matches!(
            reconciler(&api).update_load_balancer(&svc, &[]).await,
            Err(CloudError::LoadBalancerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_load_balancer_reports_absence_as_none() {
        let api = std::sync::Arc::new(FakeLb::default());
        let svc = service("uid-1", &[(80, 30080)]);
        let r = reconciler(&api);
        assert!(r.get_load_balancer(&svc).await.unwrap().is_none());

        api.seed_balancer(&load_balancer_name("uid-1"), &[]);
        let status = r.get_load_balancer(&svc).await.unwrap().unwrap();
        assert_eq!(status.address, "203.0.113.10");
    }

    #[tokio::test]
    async fn ensure_deleted_is_noop_when_absent() {
        let api = std::sync::Arc::new(FakeLb::default());
        let svc = service("uid-1", &[(80, 30080)]);
        reconciler(&api)
            .ensure_load_balancer_deleted(&svc)
            .await
            .unwrap();
        assert!(api.ops().is_empty());
    }

    #[tokio::test]
    async fn ensure_deleted_removes_the_balancer() {
        let api = std::sync::Arc::new(FakeLb::default());
        let name = load_balancer_name("uid-1");
        let lb_id = api.seed_balancer(&name, &[80]);

        let svc = service("uid-1", &[(80, 30080)]);
        reconciler(&api)
            .ensure_load_balancer_deleted(&svc)
            .await
            .unwrap();

        assert!(api.ops().contains(&format!("delete-lb:{lb_id}")));
        assert!(api.state.lock().unwrap().balancers.is_empty());
    }
}
