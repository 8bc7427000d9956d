// # ltm-core
//
// Core library for reconciling load balancer node definitions.
//
// ## Architecture Overview
//
// - **NodeApi**: Trait for the load balancer's node management API
// - **NodeReconciler**: Create/read/update/delete/exists/import of a node
// - **address**: Static vs FQDN classification and read-side normalization
// - **StateStore**: Tracked node state kept by hosts
// - **ApiRegistry**: Plugin-based registry for API clients and state stores
//
// ## Design Principles
//
// 1. **Typed input**: A node is a `NodeConfig`, validated once at the boundary
// 2. **Injected client**: The reconciler receives its API handle explicitly
// 3. **Single-shot**: No retries, no caching; every failure surfaces once
// 4. **Not-found is not an error**: Reads report absence as `Ok(None)`

pub mod address;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use address::AddressKind;
pub use config::{ApiConfig, FqdnConfig, LtmConfig, NodeConfig, StateStoreConfig};
pub use error::{Error, Result};
pub use reconciler::{NodeId, NodeReconciler};
pub use registry::ApiRegistry;
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{NodeApi, RemoteNode, StateStore};
