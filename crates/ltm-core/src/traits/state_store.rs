// # State Store Trait
//
// Defines the interface for tracked node state.
//
// ## Purpose
//
// A host keeps the last known definition of every node it manages, keyed
// by node identifier (the node name). The record is refreshed after every
// successful read and dropped when the node is deleted or found missing.
//
// ## Implementations
//
// - In-memory: `MemoryStateStore`
// - File-based: `FileStateStore` (JSON, atomic writes)
//
// ## Usage
//
// ```rust,ignore
// use ltm_core::{NodeConfig, StateStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StateStore implementation */;
//
//     store.set_node("/Common/node1", &NodeConfig::new("/Common/node1", "10.0.0.5")).await?;
//     let tracked = store.get_record("/Common/node1").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::NodeConfig;

/// Tracked state for one node
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Last known definition of the node
    pub node: NodeConfig,
    /// When the definition was last confirmed against the API
    pub last_refreshed: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a new state record stamped with the current time
    pub fn new(node: NodeConfig) -> Self {
        Self {
            node,
            last_refreshed: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the tracked record for a node
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The node is tracked
    /// - `Ok(None)`: No record found
    /// - `Err(Error)`: Storage error
    async fn get_record(&self, id: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Track a node definition, stamping it with the current time
    async fn set_node(&self, id: &str, node: &NodeConfig) -> Result<(), crate::Error>;

    /// Stop tracking a node (no-op if it was not tracked)
    async fn delete_record(&self, id: &str) -> Result<(), crate::Error>;

    /// List all tracked node identifiers
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing state stores from configuration
#[async_trait]
pub trait StateStoreFactory: Send + Sync {
    /// Create a StateStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StateStoreConfig,
    ) -> Result<Box<dyn StateStore>, crate::Error>;
}
