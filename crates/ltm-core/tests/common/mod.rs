//! Test doubles and common utilities for reconciler contract tests
//!
//! `FakeNodeApi` keeps nodes in memory the way the management API would
//! report them, and records every call it receives.

#![allow(dead_code)]

use ltm_core::error::{Error, Result};
use ltm_core::traits::{NewNode, NodeApi, NodeModification, RemoteFqdn, RemoteNode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A call received by the fake API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateStatic(NewNode),
    CreateFqdn(NewNode),
    Get(String),
    Modify(String, NodeModification),
    Delete(String),
}

/// In-memory NodeApi that behaves like a load balancer
#[derive(Clone, Default)]
pub struct FakeNodeApi {
    nodes: Arc<Mutex<HashMap<String, RemoteNode>>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
    /// Route domain appended to static addresses on create (e.g. 2 → "%2")
    route_domain: Option<u32>,
    /// Error every call returns while set
    failure: Arc<Mutex<Option<(u16, String)>>>,
}

impl FakeNodeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report static addresses with a `%<id>` suffix
    pub fn with_route_domain(mut self, route_domain: u32) -> Self {
        self.route_domain = Some(route_domain);
        self
    }

    /// Make every subsequent call fail with the given status
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Stop injecting failures
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Put a node into the fake as if created out of band
    pub fn insert(&self, node: RemoteNode) {
        self.nodes
            .lock()
            .unwrap()
            .insert(node.full_path.clone(), node);
    }

    /// Current remote representation of a node
    pub fn node(&self, name: &str) -> Option<RemoteNode> {
        self.nodes.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn static_creates(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::CreateStatic(_)))
    }

    pub fn fqdn_creates(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::CreateFqdn(_)))
    }

    pub fn modifies(&self) -> Vec<NodeModification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Modify(_, m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().as_ref() {
            Some((status, message)) => Err(Error::api(*status, message.clone())),
            None => Ok(()),
        }
    }

    fn store(&self, node: &NewNode, address: String, fqdn: RemoteFqdn) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(&node.name) {
            return Err(Error::api(409, format!("The requested Node ({}) already exists", node.name)));
        }

        let short_name = node.name.rsplit('/').next().unwrap_or(&node.name).to_string();
        nodes.insert(
            node.name.clone(),
            RemoteNode {
                name: short_name,
                partition: "Common".to_string(),
                full_path: node.name.clone(),
                address,
                connection_limit: node.connection_limit,
                dynamic_ratio: node.dynamic_ratio,
                ratio: node.ratio,
                monitor: node.monitor.clone(),
                rate_limit: node.rate_limit.clone(),
                state: "unchecked".to_string(),
                session: "user-enabled".to_string(),
                fqdn,
            },
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl NodeApi for FakeNodeApi {
    async fn create_static_node(&self, node: &NewNode) -> Result<()> {
        self.record(ApiCall::CreateStatic(node.clone()))?;

        let address = match self.route_domain {
            Some(rd) => format!("{}%{}", node.address, rd),
            None => node.address.clone(),
        };
        self.store(node, address, RemoteFqdn::default())
    }

    async fn create_fqdn_node(&self, node: &NewNode) -> Result<()> {
        self.record(ApiCall::CreateFqdn(node.clone()))?;

        let fqdn = node
            .fqdn
            .as_ref()
            .ok_or_else(|| Error::api(400, "fqdn settings required"))?;
        let remote_fqdn = RemoteFqdn {
            address_family: fqdn.address_family.clone().unwrap_or_else(|| "ipv4".to_string()),
            autopopulate: fqdn.autopopulate.clone(),
            down_interval: fqdn.down_interval,
            interval: fqdn.interval.clone(),
            name: fqdn.name.clone(),
        };
        self.store(node, "any6".to_string(), remote_fqdn)
    }

    async fn get_node(&self, name: &str) -> Result<Option<RemoteNode>> {
        self.record(ApiCall::Get(name.to_string()))?;
        Ok(self.node(name))
    }

    async fn modify_node(&self, name: &str, modification: &NodeModification) -> Result<()> {
        self.record(ApiCall::Modify(name.to_string(), modification.clone()))?;

        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get_mut(name)
            .ok_or_else(|| Error::api(404, format!("Node {} not found", name)))?;

        node.connection_limit = modification.connection_limit;
        node.dynamic_ratio = modification.dynamic_ratio;
        node.monitor = modification.monitor.clone();
        node.rate_limit = modification.rate_limit.clone();
        node.state = modification.state.clone();
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        self.record(ApiCall::Delete(name.to_string()))?;

        match self.nodes.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::api(404, format!("Node {} not found", name))),
        }
    }

    fn api_name(&self) -> &'static str {
        "fake"
    }
}

/// A static node as the API would hold it
pub fn remote_static(full_path: &str, address: &str) -> RemoteNode {
    RemoteNode {
        name: full_path.rsplit('/').next().unwrap_or(full_path).to_string(),
        partition: "Common".to_string(),
        full_path: full_path.to_string(),
        address: address.to_string(),
        ratio: 1,
        rate_limit: "disabled".to_string(),
        state: "unchecked".to_string(),
        ..Default::default()
    }
}
