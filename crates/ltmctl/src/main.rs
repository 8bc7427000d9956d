// # ltmctl - LTM node reconciler CLI
//
// This binary is a THIN integration layer:
// - DO NOT add reconciliation, address, or retry logic here
// - All node logic lives in ltm-core
// - Connection settings come from environment variables ONLY
//
// The ltmctl binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering the API client and state stores
// 4. Dispatching one reconciler operation per invocation
//
// ## Configuration
//
// ### Management API
// - `BIGIP_HOST`: Management address (host, host:port, or full URL)
// - `BIGIP_USER`: Username
// - `BIGIP_PASSWORD`: Password
// - `BIGIP_PORT`: Management port (default 443)
// - `BIGIP_TOKEN_AUTH`: Use token authentication (`true`/`false`)
// - `BIGIP_LOGIN_REF`: Login provider for token auth (default `tmos`)
// - `BIGIP_INSECURE`: Skip TLS certificate verification (`true`/`false`)
//
// ### State Store
// - `LTM_STATE_STORE_TYPE`: Type of state store (file, memory)
// - `LTM_STATE_STORE_PATH`: Path to state file (for file store)
//
// ### Logging
// - `LTM_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export BIGIP_HOST=10.1.1.245
// export BIGIP_USER=admin
// export BIGIP_PASSWORD=admin
// export LTM_STATE_STORE_PATH=/var/lib/ltm/state.json
//
// ltmctl apply node1.json
// ltmctl show /Common/node1
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ltm_core::address::same_address;
use ltm_core::{
    ApiConfig, ApiRegistry, LtmConfig, NodeConfig, NodeReconciler, StateStore, StateStoreConfig,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum LtmExitCode {
    /// Operation completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Operation failed
    RuntimeError = 2,
}

impl From<LtmExitCode> for ExitCode {
    fn from(code: LtmExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Parser)]
#[command(name = "ltmctl", version, about = "Reconcile BIG-IP LTM nodes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or update a node from a JSON definition
    Apply {
        /// Path to the node definition
        file: PathBuf,
    },
    /// Read a node back from the device
    Show { name: String },
    /// Report whether a node exists on the device
    Exists { name: String },
    /// Delete a node
    Delete { name: String },
    /// Start tracking an existing node
    Import { name: String },
    /// List tracked nodes
    List,
}

/// Application configuration
struct Config {
    host: String,
    user: String,
    password: String,
    port: u16,
    token_auth: bool,
    login_ref: String,
    insecure: bool,
    state_store_type: String,
    state_store_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false)
        };

        let port = match lookup("BIGIP_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("BIGIP_PORT is not a valid port: {}", port))?,
            None => 443,
        };

        Ok(Self {
            host: lookup("BIGIP_HOST").context("BIGIP_HOST is required")?,
            user: lookup("BIGIP_USER").context("BIGIP_USER is required")?,
            password: lookup("BIGIP_PASSWORD").unwrap_or_default(),
            port,
            token_auth: flag("BIGIP_TOKEN_AUTH"),
            login_ref: lookup("BIGIP_LOGIN_REF").unwrap_or_else(|| "tmos".to_string()),
            insecure: flag("BIGIP_INSECURE"),
            state_store_type: lookup("LTM_STATE_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            state_store_path: lookup("LTM_STATE_STORE_PATH")
                .unwrap_or_else(|| "ltm-state.json".to_string()),
            log_level: lookup("LTM_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.state_store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "LTM_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        if self.state_store_type == "file" && self.state_store_path.is_empty() {
            anyhow::bail!("LTM_STATE_STORE_PATH cannot be empty when LTM_STATE_STORE_TYPE=file");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LTM_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.ltm_config().validate()?;
        Ok(())
    }

    fn ltm_config(&self) -> LtmConfig {
        let state_store = match self.state_store_type.as_str() {
            "memory" => StateStoreConfig::Memory,
            _ => StateStoreConfig::File {
                path: self.state_store_path.clone(),
            },
        };

        LtmConfig {
            api: ApiConfig::Bigip {
                address: self.host.clone(),
                username: self.user.clone(),
                password: self.password.clone(),
                port: self.port,
                token_auth: self.token_auth,
                login_reference: self.login_ref.clone(),
                insecure: self.insecure,
            },
            state_store,
        }
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return LtmExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return LtmExitCode::ConfigError.into();
    }

    // Logs go to stderr; stdout carries the node JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LtmExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LtmExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config.ltm_config(), cli.command).await {
            Ok(()) => LtmExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                LtmExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build components and run one command
async fn run(config: LtmConfig, command: Command) -> Result<()> {
    let registry = ApiRegistry::with_builtin_stores();

    #[cfg(feature = "bigip")]
    ltm_client_bigip::register(&registry);

    let api = registry
        .create_api(&config.api)
        .context("Failed to create management API client")?;
    let store = registry
        .create_state_store(&config.state_store)
        .await
        .context("Failed to open state store")?;
    let reconciler = NodeReconciler::new(api);

    info!(
        api = reconciler.api_name(),
        state_store = config.state_store.type_name(),
        "ltmctl ready"
    );

    match command {
        Command::Apply { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let node: NodeConfig = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid node definition in {}", file.display()))?;
            node.validate()?;

            let applied = apply(&reconciler, store.as_ref(), &node).await?;
            print_node(&applied)?;
        }
        Command::Show { name } => {
            let prior = store.get_record(&name).await?.map(|r| r.node);
            match reconciler.read(&name, prior.as_ref()).await? {
                Some(node) => {
                    if let Some(prior) = &prior {
                        track(store.as_ref(), &node, &prior.address).await?;
                    }
                    print_node(&node)?;
                }
                None => {
                    untrack(store.as_ref(), &name).await?;
                    anyhow::bail!("Node {} not found", name);
                }
            }
        }
        Command::Exists { name } => {
            let exists = reconciler.exists(&name).await?;
            if !exists {
                untrack(store.as_ref(), &name).await?;
            }
            println!("{}", exists);
        }
        Command::Delete { name } => {
            reconciler.delete(&name).await?;
            untrack(store.as_ref(), &name).await?;
            info!("Node ({}) deleted", name);
        }
        Command::Import { name } => {
            let node = reconciler
                .import(&name)
                .await?
                .with_context(|| format!("Node {} not found", name))?;
            store.set_node(&name, &node).await?;
            print_node(&node)?;
        }
        Command::List => {
            for id in store.list_records().await? {
                println!("{}", id);
            }
        }
    }

    store.flush().await?;
    Ok(())
}

/// Bring the device in line with a node definition
///
/// Name and address are immutable on the device, so an address change on a
/// tracked node replaces it. Addresses are compared by what they name, not
/// by spelling.
async fn apply(
    reconciler: &NodeReconciler,
    store: &dyn StateStore,
    node: &NodeConfig,
) -> Result<NodeConfig> {
    let tracked = store.get_record(&node.name).await?;

    let remote_exists = match &tracked {
        Some(_) => reconciler.exists(&node.name).await?,
        None => false,
    };

    let applied = match tracked {
        Some(record) if remote_exists && same_address(&record.node.address, &node.address) => {
            reconciler.update(&node.name, node).await?
        }
        Some(record) if remote_exists => {
            info!(
                "Node ({}) address changed from {} to {}, replacing",
                node.name, record.node.address, node.address
            );
            reconciler.delete(&node.name).await?;
            let id = reconciler.create(node).await?;
            reconciler.read(&id, Some(node)).await?
        }
        tracked => {
            if tracked.is_some() {
                warn!("Node ({}) tracked but missing, recreating", node.name);
            }
            let id = reconciler.create(node).await?;
            reconciler.read(&id, Some(node)).await?
        }
    };

    let applied = applied.with_context(|| format!("Node {} vanished after apply", node.name))?;
    track(store, &applied, &node.address).await?;
    Ok(applied)
}

/// Track a node under the address the user wrote
///
/// Reads report the FQDN name or the device's spelling of an IP literal,
/// which is not what the next `apply` will be compared against.
async fn track(store: &dyn StateStore, node: &NodeConfig, address: &str) -> Result<()> {
    let mut tracked = node.clone();
    tracked.address = address.to_string();
    store.set_node(&tracked.name, &tracked).await?;
    Ok(())
}

async fn untrack(store: &dyn StateStore, name: &str) -> Result<()> {
    if store.get_record(name).await?.is_some() {
        store.delete_record(name).await?;
    }
    Ok(())
}

fn print_node(node: &NodeConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}
