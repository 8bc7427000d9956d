//! Core traits for the LTM node reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`NodeApi`]: Create, fetch, modify and delete nodes through a management API
//! - [`StateStore`]: Tracked node state kept by hosts

pub mod node_api;
pub mod state_store;

pub use node_api::{
    NewFqdn, NewNode, NodeApi, NodeApiFactory, NodeModification, RemoteFqdn, RemoteNode,
};
pub use state_store::{StateRecord, StateStore, StateStoreFactory};
