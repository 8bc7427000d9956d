// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Tracks node definitions for the lifetime of the process only. Useful for
// tests and one-shot invocations where the API is the only source of truth.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::{NodeConfig, StateStoreConfig};
use crate::traits::state_store::{StateRecord, StateStore, StateStoreFactory};

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use ltm_core::NodeConfig;
/// use ltm_core::state::MemoryStateStore;
/// use ltm_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     let node = NodeConfig::new("/Common/node1", "10.0.0.5");
///     store.set_node("/Common/node1", &node).await?;
///
///     let tracked = store.get_record("/Common/node1").await?;
///     assert_eq!(tracked.map(|r| r.node), Some(node));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of tracked nodes
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(&self, id: &str) -> Result<Option<StateRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn set_node(&self, id: &str, node: &NodeConfig) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(id.to_string(), StateRecord::new(node.clone()));
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(id);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}

/// Factory for in-memory state stores
pub struct MemoryStateStoreFactory;

#[async_trait]
impl StateStoreFactory for MemoryStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>, Error> {
        match config {
            StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
            _ => Err(Error::config("Invalid config for memory state store")),
        }
    }
}
