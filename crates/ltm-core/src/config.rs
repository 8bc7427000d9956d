//! Configuration types for the LTM node reconciler
//!
//! This module defines the desired-state record for a node plus the
//! connection and state store settings used by hosts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `/Partition/Name`, letters, digits and `._-:` only
static NODE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[\w_\-.]+/[\w_\-.:]+$").expect("node name pattern is valid")
});

/// Desired state of a single LTM node
///
/// `name` and `address` are fixed once the node exists. All other fields
/// may change between reconciliations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Full path of the node (e.g., "/Common/node1"); also its identifier
    pub name: String,

    /// Static IPv4/IPv6 literal or a domain name
    pub address: String,

    /// Maximum connections per second, or "disabled"
    #[serde(default = "default_rate_limit")]
    pub rate_limit: String,

    /// Maximum concurrent connections (0 = unlimited)
    #[serde(default)]
    pub connection_limit: u32,

    /// Dynamic ratio weight for dynamic ratio load balancing
    #[serde(default)]
    pub dynamic_ratio: i64,

    /// Fixed ratio weight for ratio load balancing
    #[serde(default = "default_ratio")]
    pub ratio: i64,

    /// Monitor or monitor rule reference (empty = none)
    #[serde(default)]
    pub monitor: String,

    /// Administrative state (e.g., "user-up", "user-down")
    #[serde(default = "default_state")]
    pub state: String,

    /// Dynamic DNS settings, only meaningful for FQDN nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<FqdnConfig>,
}

impl NodeConfig {
    /// Create a node definition with default limits and state
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            rate_limit: default_rate_limit(),
            connection_limit: 0,
            dynamic_ratio: 0,
            ratio: default_ratio(),
            monitor: String::new(),
            state: default_state(),
            fqdn: None,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: impl Into<String>) -> Self {
        self.rate_limit = rate_limit.into();
        self
    }

    pub fn with_connection_limit(mut self, connection_limit: u32) -> Self {
        self.connection_limit = connection_limit;
        self
    }

    pub fn with_dynamic_ratio(mut self, dynamic_ratio: i64) -> Self {
        self.dynamic_ratio = dynamic_ratio;
        self
    }

    pub fn with_ratio(mut self, ratio: i64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_monitor(mut self, monitor: impl Into<String>) -> Self {
        self.monitor = monitor.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_fqdn(mut self, fqdn: FqdnConfig) -> Self {
        self.fqdn = Some(fqdn);
        self
    }

    /// Validate the node definition
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_node_name(&self.name)?;

        if self.address.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Node {} has an empty address",
                self.name
            )));
        }

        if self.state.is_empty() {
            return Err(crate::Error::config(format!(
                "Node {} has an empty state",
                self.name
            )));
        }

        Ok(())
    }
}

/// Check that a node name has the `/Partition/Name` form
pub fn validate_node_name(name: &str) -> Result<(), crate::Error> {
    if NODE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(crate::Error::config(format!(
            "{name:?} must match /Partition/Name and contain letters, numbers or [._-:]. e.g. /Common/my-node"
        )))
    }
}

/// Dynamic DNS resolution settings for an FQDN node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FqdnConfig {
    /// Address family of resolved addresses ("ipv4", "ipv6"); unset = IP-agnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_family: Option<String>,

    /// Domain name to resolve; the node address is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Seconds between DNS queries
    #[serde(default = "default_fqdn_interval")]
    pub interval: String,

    /// Number of attempts to resolve the name before marking it down
    #[serde(default = "default_fqdn_down_interval")]
    pub down_interval: u32,

    /// Whether the node scales to every address DNS returns
    #[serde(default = "default_autopopulate")]
    pub autopopulate: String,
}

impl Default for FqdnConfig {
    fn default() -> Self {
        Self {
            address_family: None,
            name: None,
            interval: default_fqdn_interval(),
            down_interval: default_fqdn_down_interval(),
            autopopulate: default_autopopulate(),
        }
    }
}

fn default_rate_limit() -> String {
    "disabled".to_string()
}

fn default_ratio() -> i64 {
    1
}

fn default_state() -> String {
    "user-up".to_string()
}

fn default_fqdn_interval() -> String {
    "3600".to_string()
}

fn default_fqdn_down_interval() -> u32 {
    5
}

fn default_autopopulate() -> String {
    "disabled".to_string()
}

/// Top-level host configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LtmConfig {
    /// Management API connection
    pub api: ApiConfig,

    /// Where tracked node state is kept
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

impl LtmConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.api.validate()?;
        self.state_store.validate()
    }
}

/// Management API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiConfig {
    /// BIG-IP iControl REST
    Bigip {
        /// Management host name or address
        address: String,
        /// Management user
        username: String,
        /// Management password
        /// ⚠️ NEVER log this value
        password: String,
        /// Management port
        #[serde(default = "default_port")]
        port: u16,
        /// Use token authentication instead of basic auth
        #[serde(default)]
        token_auth: bool,
        /// Login provider for token authentication
        #[serde(default = "default_login_reference")]
        login_reference: String,
        /// Accept self-signed management certificates
        #[serde(default)]
        insecure: bool,
    },

    /// Custom API implementation
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ApiConfig {
    /// Validate the API configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ApiConfig::Bigip {
                address, username, ..
            } => {
                if address.is_empty() {
                    return Err(crate::Error::config("BIG-IP address cannot be empty"));
                }
                if username.is_empty() {
                    return Err(crate::Error::config("BIG-IP username cannot be empty"));
                }
                Ok(())
            }
            ApiConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom API factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom API config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the API type name used for registry lookups
    pub fn type_name(&self) -> &str {
        match self {
            ApiConfig::Bigip { .. } => "bigip",
            ApiConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig::Bigip {
            address: String::new(),
            username: String::new(),
            password: String::new(),
            port: default_port(),
            token_auth: false,
            login_reference: default_login_reference(),
            insecure: false,
        }
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiConfig::Bigip {
                address,
                username,
                port,
                token_auth,
                login_reference,
                insecure,
                ..
            } => f
                .debug_struct("Bigip")
                .field("address", address)
                .field("username", username)
                .field("password", &"<REDACTED>")
                .field("port", port)
                .field("token_auth", token_auth)
                .field("login_reference", login_reference)
                .field("insecure", insecure)
                .finish(),
            ApiConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

fn default_port() -> u16 {
    443
}

fn default_login_reference() -> String {
    "tmos".to_string()
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,

    /// Custom state store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            StateStoreConfig::Custom { factory, .. } if factory.is_empty() => Err(
                crate::Error::config("Custom state store factory cannot be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Get the state store type name used for registry lookups
    pub fn type_name(&self) -> &str {
        match self {
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
            StateStoreConfig::Custom { factory, .. } => factory,
        }
    }
}
