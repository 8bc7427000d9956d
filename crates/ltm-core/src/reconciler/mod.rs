//! Node reconciler
//!
//! The NodeReconciler is responsible for:
//! - Classifying a node address as static or FQDN
//! - Creating the matching remote object type
//! - Reading remote nodes back into their desired-state shape
//! - Applying changes to mutable fields
//! - Deleting nodes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   NodeConfig   ┌────────────────┐   NewNode /          ┌─────────────┐
//! │    Host     │ ─────────────▶ │ NodeReconciler │ ───────────────────▶ │   NodeApi   │
//! │ (ltmctl)    │ ◀───────────── │                │ ◀─────────────────── │ (iControl)  │
//! └─────────────┘  NodeConfig /  └────────────────┘   RemoteNode          └─────────────┘
//!                  not found
//! ```
//!
//! Every operation is a single call (or, for update, modify followed by a
//! read) against the API. The reconciler never retries and keeps no state
//! between calls; not-found is reported as `Ok(None)` / `Ok(false)` so hosts
//! can drop the node from their tracked state.

use crate::address::{self, AddressKind};
use crate::config::{FqdnConfig, NodeConfig};
use crate::error::{Error, Result};
use crate::traits::{NewFqdn, NewNode, NodeApi, NodeModification, RemoteNode};
use tracing::{debug, error, info, warn};

/// Identifier of a managed node (its full name)
pub type NodeId = String;

/// Reconciles node definitions against a management API
///
/// ## Threading
///
/// The reconciler holds no mutable state; it can be shared across tasks
/// that manage independent nodes.
pub struct NodeReconciler {
    api: Box<dyn NodeApi>,
}

impl NodeReconciler {
    /// Create a reconciler over a node API implementation
    pub fn new(api: Box<dyn NodeApi>) -> Self {
        Self { api }
    }

    /// Name of the underlying API (for logging)
    pub fn api_name(&self) -> &'static str {
        self.api.api_name()
    }

    /// Create a node
    ///
    /// Static addresses create a plain node; anything else creates an FQDN
    /// node using `node.fqdn`, or default resolution settings when unset.
    ///
    /// # Returns
    ///
    /// The node identifier, which is the node name.
    pub async fn create(&self, node: &NodeConfig) -> Result<NodeId> {
        let kind = address::classify(&node.address);
        info!("Creating {} node {}::{}", kind, node.name, node.address);

        let result = match kind {
            AddressKind::Static => self.api.create_static_node(&new_node(node, None)).await,
            AddressKind::Fqdn => {
                let fqdn = node.fqdn.clone().unwrap_or_default();
                let payload = new_node(node, Some(new_fqdn(&node.address, fqdn)));
                self.api.create_fqdn_node(&payload).await
            }
        };

        if let Err(e) = result {
            error!("Unable to create node {}: {}", node.name, e);
            return Err(e);
        }

        Ok(node.name.clone())
    }

    /// Read a node back into its desired-state shape
    ///
    /// Fields the API reports (address, monitor, rate limit, connection
    /// limit, dynamic ratio) come from the remote node; the rest are kept
    /// from `prior`, or defaulted when there is none.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(NodeConfig))`: The node exists
    /// - `Ok(None)`: The node is gone; drop it from tracked state
    /// - `Err(Error)`: The fetch failed or the remote address is malformed
    pub async fn read(&self, id: &str, prior: Option<&NodeConfig>) -> Result<Option<NodeConfig>> {
        info!("Fetching node {}", id);

        let Some(remote) = self.fetch(id).await? else {
            warn!("Node ({}) not found, removing from state", id);
            return Ok(None);
        };

        let mut node = prior
            .cloned()
            .unwrap_or_else(|| NodeConfig::new(id, String::new()));
        node.name = id.to_string();
        node.address = address::normalize_address(&remote)?;
        node.monitor = remote.monitor;
        node.rate_limit = remote.rate_limit;
        node.connection_limit = remote.connection_limit;
        node.dynamic_ratio = remote.dynamic_ratio;

        debug!("Read node {} with address {}", id, node.address);
        Ok(Some(node))
    }

    /// Check whether a node exists
    ///
    /// `Ok(false)` means the host should drop the node from tracked state.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        info!("Fetching node {}", id);

        match self.fetch(id).await? {
            Some(_) => Ok(true),
            None => {
                warn!("Node ({}) not found, removing from state", id);
                Ok(false)
            }
        }
    }

    /// Apply the mutable fields of `node` and re-read it
    ///
    /// The modify call is issued for both address kinds and never carries
    /// the address, which is immutable.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` if `node.name` is not `id`; names cannot change.
    pub async fn update(&self, id: &str, node: &NodeConfig) -> Result<Option<NodeConfig>> {
        if node.name != id {
            return Err(Error::invalid_input(format!(
                "Node name is immutable: {} cannot become {}",
                id, node.name
            )));
        }

        let kind = address::classify(&node.address);
        let modification = NodeModification {
            connection_limit: node.connection_limit,
            dynamic_ratio: node.dynamic_ratio,
            monitor: node.monitor.clone(),
            rate_limit: node.rate_limit.clone(),
            state: node.state.clone(),
        };

        info!("Modifying {} node {}", kind, id);
        if let Err(e) = self.api.modify_node(id, &modification).await {
            error!("Unable to modify node {}: {}", id, e);
            return Err(e);
        }

        self.read(id, Some(node)).await
    }

    /// Delete a node
    pub async fn delete(&self, id: &str) -> Result<()> {
        info!("Deleting node {}", id);

        if let Err(e) = self.api.delete_node(id).await {
            error!("Unable to delete node {}: {}", id, e);
            return Err(e);
        }

        Ok(())
    }

    /// Import an existing node by identifier
    ///
    /// The identifier is used verbatim as the node name.
    pub async fn import(&self, id: &str) -> Result<Option<NodeConfig>> {
        self.read(id, None).await
    }

    /// Fetch a node, folding not-found errors into `None`
    async fn fetch(&self, id: &str) -> Result<Option<RemoteNode>> {
        match self.api.get_node(id).await {
            Ok(node) => Ok(node),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                error!("Unable to retrieve node {}: {}", id, e);
                Err(e)
            }
        }
    }
}

fn new_node(node: &NodeConfig, fqdn: Option<NewFqdn>) -> NewNode {
    NewNode {
        name: node.name.clone(),
        address: node.address.clone(),
        rate_limit: node.rate_limit.clone(),
        connection_limit: node.connection_limit,
        dynamic_ratio: node.dynamic_ratio,
        ratio: node.ratio,
        monitor: node.monitor.clone(),
        state: node.state.clone(),
        fqdn,
    }
}

fn new_fqdn(address: &str, fqdn: FqdnConfig) -> NewFqdn {
    NewFqdn {
        address_family: fqdn.address_family,
        name: fqdn.name.unwrap_or_else(|| address.to_string()),
        interval: fqdn.interval,
        down_interval: fqdn.down_interval,
        autopopulate: fqdn.autopopulate,
    }
}
