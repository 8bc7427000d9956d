// # Node API Trait
//
// Defines the interface to a load balancer's node management API.
//
// ## Implementations
//
// - BIG-IP iControl REST: `ltm-client-bigip` crate
//
// ## Usage
//
// ```rust,ignore
// use ltm_core::NodeApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* NodeApi implementation */;
//
//     match api.get_node("/Common/node1").await? {
//         Some(node) => println!("address: {}", node.address),
//         None => println!("no such node"),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A node as reported by the management API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteNode {
    pub name: String,
    pub partition: String,
    pub full_path: String,
    /// Raw address, possibly carrying a route domain suffix ("10.0.0.5%2")
    pub address: String,
    pub connection_limit: u32,
    pub dynamic_ratio: i64,
    pub ratio: i64,
    pub monitor: String,
    pub rate_limit: String,
    pub state: String,
    pub session: String,
    pub fqdn: RemoteFqdn,
}

/// FQDN block of a remote node; `name` is empty for static nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteFqdn {
    pub address_family: String,
    pub autopopulate: String,
    pub down_interval: u32,
    pub interval: String,
    #[serde(rename = "tmName")]
    pub name: String,
}

/// Payload for creating a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub name: String,
    pub address: String,
    pub rate_limit: String,
    pub connection_limit: u32,
    pub dynamic_ratio: i64,
    pub ratio: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub monitor: String,
    pub state: String,
    /// Present only for FQDN nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<NewFqdn>,
}

/// FQDN settings sent when creating an FQDN node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFqdn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_family: Option<String>,
    #[serde(rename = "tmName")]
    pub name: String,
    pub interval: String,
    pub down_interval: u32,
    pub autopopulate: String,
}

/// Payload for modifying the mutable fields of a node
///
/// Name and address are immutable and never part of a modification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModification {
    pub connection_limit: u32,
    pub dynamic_ratio: i64,
    pub monitor: String,
    pub rate_limit: String,
    pub state: String,
}

/// Trait for node management API implementations
///
/// Each method is a single round trip. Implementations must not retry,
/// cache, or spawn tasks; callers see every failure exactly once.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Create a node addressed by a static IPv4/IPv6 literal
    async fn create_static_node(&self, node: &NewNode) -> Result<(), crate::Error>;

    /// Create a node addressed by a domain name
    ///
    /// `node.fqdn` carries the resolution settings.
    async fn create_fqdn_node(&self, node: &NewNode) -> Result<(), crate::Error>;

    /// Fetch a node by name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(RemoteNode))`: The node exists
    /// - `Ok(None)`: The API does not know the node
    /// - `Err(Error)`: The request failed
    async fn get_node(&self, name: &str) -> Result<Option<RemoteNode>, crate::Error>;

    /// Modify the mutable fields of an existing node
    async fn modify_node(
        &self,
        name: &str,
        modification: &NodeModification,
    ) -> Result<(), crate::Error>;

    /// Delete a node by name
    async fn delete_node(&self, name: &str) -> Result<(), crate::Error>;

    /// Get the API name (for logging/debugging)
    fn api_name(&self) -> &'static str;
}

/// Helper trait for constructing node APIs from configuration
pub trait NodeApiFactory: Send + Sync {
    /// Create a NodeApi instance from configuration
    fn create(&self, config: &crate::config::ApiConfig) -> Result<Box<dyn NodeApi>, crate::Error>;
}
