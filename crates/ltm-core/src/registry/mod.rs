//! Plugin-based API registry
//!
//! The registry allows node API clients and state stores to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ltm_core::ApiRegistry;
//! use ltm_core::config::ApiConfig;
//!
//! let registry = ApiRegistry::with_builtin_stores();
//! ltm_client_bigip::register(&registry);
//!
//! let config = ApiConfig::Bigip { ... };
//! let api = registry.create_api(&config)?;
//! ```

use crate::config::{ApiConfig, StateStoreConfig};
use crate::error::{Error, Result};
use crate::state::{FileStateStoreFactory, MemoryStateStoreFactory};
use crate::traits::{NodeApi, NodeApiFactory, StateStore, StateStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of node API and state store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ApiRegistry {
    apis: RwLock<HashMap<String, Box<dyn NodeApiFactory>>>,
    state_stores: RwLock<HashMap<String, Arc<dyn StateStoreFactory>>>,
}

impl ApiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` state stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_state_store("memory", Box::new(MemoryStateStoreFactory));
        registry.register_state_store("file", Box::new(FileStateStoreFactory));
        registry
    }

    /// Register a node API factory under a type name (e.g., "bigip")
    pub fn register_api(&self, name: impl Into<String>, factory: Box<dyn NodeApiFactory>) {
        let mut apis = self.apis.write().unwrap_or_else(|e| e.into_inner());
        apis.insert(name.into(), factory);
    }

    /// Register a state store factory under a type name (e.g., "file")
    pub fn register_state_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn StateStoreFactory>,
    ) {
        let mut stores = self.state_stores.write().unwrap_or_else(|e| e.into_inner());
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create a node API from configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if the API type is not registered, or whatever the
    /// factory reports.
    pub fn create_api(&self, config: &ApiConfig) -> Result<Box<dyn NodeApi>> {
        let api_type = config.type_name();
        let apis = self.apis.read().unwrap_or_else(|e| e.into_inner());

        let factory = apis
            .get(api_type)
            .ok_or_else(|| Error::config(format!("Unknown API type: {}", api_type)))?;

        factory.create(config)
    }

    /// Create a state store from configuration
    pub async fn create_state_store(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>> {
        let store_type = config.type_name();

        // Release the lock before calling async create
        let factory = {
            let stores = self.state_stores.read().unwrap_or_else(|e| e.into_inner());
            stores
                .get(store_type)
                .ok_or_else(|| Error::config(format!("Unknown state store type: {}", store_type)))?
                .clone()
        };

        factory.create(config).await
    }

    /// List all registered API types
    pub fn list_apis(&self) -> Vec<String> {
        let apis = self.apis.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = apis.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an API type is registered
    pub fn has_api(&self, name: &str) -> bool {
        let apis = self.apis.read().unwrap_or_else(|e| e.into_inner());
        apis.contains_key(name)
    }

    /// Check if a state store type is registered
    pub fn has_state_store(&self, name: &str) -> bool {
        let stores = self.state_stores.read().unwrap_or_else(|e| e.into_inner());
        stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockApiFactory;

    impl NodeApiFactory for MockApiFactory {
        fn create(&self, _config: &ApiConfig) -> Result<Box<dyn NodeApi>> {
            Err(Error::config("Mock API not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ApiRegistry::new();
        assert!(!registry.has_api("mock"));

        registry.register_api("mock", Box::new(MockApiFactory));

        assert!(registry.has_api("mock"));
        assert_eq!(registry.list_apis(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_unknown_api_type() {
        let registry = ApiRegistry::new();
        let config = ApiConfig::Custom {
            factory: "nope".to_string(),
            config: serde_json::json!({}),
        };

        let err = registry.create_api(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_builtin_state_stores() {
        let registry = ApiRegistry::with_builtin_stores();
        assert!(registry.has_state_store("memory"));
        assert!(registry.has_state_store("file"));

        let store = registry
            .create_state_store(&StateStoreConfig::Memory)
            .await
            .unwrap();
        assert!(store.list_records().await.unwrap().is_empty());
    }
}
