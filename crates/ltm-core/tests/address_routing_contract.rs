//! Contract Test: Address Routing
//!
//! Verifies that the address decides which remote object type backs a node.
//!
//! Constraints verified:
//! - Static literals (IPv4 dotted quad, anything containing ':') create plain nodes
//! - Everything else creates FQDN nodes, exactly once
//! - Create failures surface verbatim and are not retried

mod common;

use common::*;
use ltm_core::{Error, FqdnConfig, NodeConfig, NodeReconciler};

#[tokio::test]
async fn static_addresses_use_static_create() {
    for (i, address) in ["10.0.0.5", "192.168.1.10", "fe80::1", "2001:db8::5"]
        .iter()
        .enumerate()
    {
        let api = FakeNodeApi::new();
        let reconciler = NodeReconciler::new(Box::new(api.clone()));

        let name = format!("/Common/node{}", i);
        let id = reconciler
            .create(&NodeConfig::new(&name, *address))
            .await
            .expect("create succeeds");

        assert_eq!(id, name, "identifier is the node name");
        assert_eq!(api.static_creates(), 1, "{address} should create a static node");
        assert_eq!(api.fqdn_creates(), 0, "{address} must not create an FQDN node");
    }
}

#[tokio::test]
async fn domain_names_use_fqdn_create() {
    for address in ["foo.example.com", "backend", "db-1.internal.example.org"] {
        let api = FakeNodeApi::new();
        let reconciler = NodeReconciler::new(Box::new(api.clone()));

        reconciler
            .create(&NodeConfig::new("/Common/web", address))
            .await
            .expect("create succeeds");

        assert_eq!(api.fqdn_creates(), 1, "{address} should create an FQDN node");
        assert_eq!(api.static_creates(), 0, "{address} must not create a static node");
    }
}

#[tokio::test]
async fn fqdn_create_carries_resolution_settings() {
    let api = FakeNodeApi::new();
    let reconciler = NodeReconciler::new(Box::new(api.clone()));

    let node = NodeConfig::new("/Common/web", "web.example.com")
        .with_monitor("/Common/http")
        .with_fqdn(FqdnConfig {
            address_family: Some("ipv6".to_string()),
            interval: "600".to_string(),
            down_interval: 3,
            autopopulate: "enabled".to_string(),
            ..Default::default()
        });
    reconciler.create(&node).await.unwrap();

    let calls = api.calls();
    let ApiCall::CreateFqdn(payload) = &calls[0] else {
        panic!("expected an FQDN create, got {:?}", calls);
    };
    let fqdn = payload.fqdn.as_ref().expect("fqdn settings sent");
    assert_eq!(payload.address, "web.example.com");
    assert_eq!(payload.monitor, "/Common/http");
    assert_eq!(fqdn.name, "web.example.com");
    assert_eq!(fqdn.address_family.as_deref(), Some("ipv6"));
    assert_eq!(fqdn.interval, "600");
    assert_eq!(fqdn.down_interval, 3);
    assert_eq!(fqdn.autopopulate, "enabled");
}

#[tokio::test]
async fn fqdn_create_without_settings_uses_defaults() {
    let api = FakeNodeApi::new();
    let reconciler = NodeReconciler::new(Box::new(api.clone()));

    reconciler
        .create(&NodeConfig::new("/Common/web", "web.example.com"))
        .await
        .unwrap();

    let calls = api.calls();
    let ApiCall::CreateFqdn(payload) = &calls[0] else {
        panic!("expected an FQDN create, got {:?}", calls);
    };
    let fqdn = payload.fqdn.as_ref().unwrap();
    assert_eq!(fqdn.interval, "3600");
    assert_eq!(fqdn.down_interval, 5);
    assert_eq!(fqdn.autopopulate, "disabled");
}

#[tokio::test]
async fn create_failure_surfaces_without_retry() {
    let api = FakeNodeApi::new();
    api.fail_with(400, "01070734:3: Configuration error");
    let reconciler = NodeReconciler::new(Box::new(api.clone()));

    let err = reconciler
        .create(&NodeConfig::new("/Common/node1", "10.0.0.5"))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "01070734:3: Configuration error");
        }
        other => panic!("expected the API error verbatim, got {:?}", other),
    }
    assert_eq!(api.calls().len(), 1, "create must be attempted exactly once");
}
