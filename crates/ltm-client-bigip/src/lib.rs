// # BIG-IP Node API
//
// This crate provides a BIG-IP iControl REST implementation of `NodeApi`.
//
// ## Behavior
//
// - One HTTP request per call (plus one login request on first use with token auth)
// - A 401 drops the cached token; the next call logs in again
// - Errors are propagated as-is; no retry, no backoff, no caching
// - A 404 on fetch means "no such node" and is returned as `Ok(None)`
// - HTTP timeout configured (30 seconds)
//
// ## Security Requirements
//
// - Password and auth token NEVER appear in logs or `Debug` output
//
// ## API Reference
//
// - Create node: POST `/mgmt/tm/ltm/node`
// - Get node: GET `/mgmt/tm/ltm/node/~Partition~name`
// - Modify node: PUT `/mgmt/tm/ltm/node/~Partition~name`
// - Delete node: DELETE `/mgmt/tm/ltm/node/~Partition~name`
// - Token login: POST `/mgmt/shared/authn/login`

use async_trait::async_trait;
use ltm_core::config::ApiConfig;
use ltm_core::traits::{NewNode, NodeApi, NodeApiFactory, NodeModification, RemoteNode};
use ltm_core::{ApiRegistry, Error, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Path of the node collection
const NODE_PATH: &str = "/mgmt/tm/ltm/node";

/// Path of the token login endpoint
const LOGIN_PATH: &str = "/mgmt/shared/authn/login";

/// Header carrying the auth token
const TOKEN_HEADER: &str = "X-F5-Auth-Token";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests authenticate
enum Auth {
    /// HTTP basic auth on every request
    Basic,
    /// Token obtained once from the login endpoint
    Token {
        login_reference: String,
        token: Mutex<Option<String>>,
    },
}

/// BIG-IP node API client
pub struct BigipClient {
    base_url: String,
    username: String,
    /// ⚠️ NEVER log this value
    password: String,
    auth: Auth,
    client: reqwest::Client,
}

// Custom Debug implementation that hides credentials
impl std::fmt::Debug for BigipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigipClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("token_auth", &matches!(self.auth, Auth::Token { .. }))
            .finish()
    }
}

impl BigipClient {
    /// Create a client using basic auth
    ///
    /// `base_url` is the management endpoint, e.g. `https://10.1.1.1:443`.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            auth: Auth::Basic,
            client,
        })
    }

    /// Switch to token authentication against the given login provider
    pub fn with_token_auth(mut self, login_reference: impl Into<String>) -> Self {
        self.auth = Auth::Token {
            login_reference: login_reference.into(),
            token: Mutex::new(None),
        };
        self
    }

    /// Build a client from an `ApiConfig::Bigip`
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        match config {
            ApiConfig::Bigip {
                address,
                username,
                password,
                port,
                token_auth,
                login_reference,
                insecure,
            } => {
                config.validate()?;

                let base_url = if address.starts_with("http://") || address.starts_with("https://") {
                    address.clone()
                } else {
                    format!("https://{}:{}", address, port)
                };

                let client = Self::new(base_url, username.clone(), password.clone(), *insecure)?;
                Ok(if *token_auth {
                    client.with_token_auth(login_reference.clone())
                } else {
                    client
                })
            }
            _ => Err(Error::config("Invalid config for BIG-IP API")),
        }
    }

    /// URL of a single node; `/Common/node1` becomes `~Common~node1`
    fn node_url(&self, name: &str) -> String {
        format!("{}{}/{}", self.base_url, NODE_PATH, name.replace('/', "~"))
    }

    fn nodes_url(&self) -> String {
        format!("{}{}", self.base_url, NODE_PATH)
    }

    /// Start a request with authentication applied
    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        debug!(url = %url, method = %method, "iControl request");
        let builder = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        match &self.auth {
            Auth::Basic => Ok(builder.basic_auth(&self.username, Some(&self.password))),
            Auth::Token {
                login_reference,
                token,
            } => {
                let mut guard = token.lock().await;
                let value = match guard.as_ref() {
                    Some(value) => value.clone(),
                    None => {
                        let value = self.login(login_reference).await?;
                        *guard = Some(value.clone());
                        value
                    }
                };
                Ok(builder.header(TOKEN_HEADER, value))
            }
        }
    }

    /// Obtain an auth token
    async fn login(&self, login_reference: &str) -> Result<String> {
        debug!("Requesting iControl auth token");
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
                "loginProviderName": login_reference,
            }))
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let response = check_status(response).await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse login response: {}", e)))?;

        json["token"]["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::auth("Login response did not contain a token"))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Auth::Token { token, .. } = &self.auth
        {
            debug!("Auth token rejected, logging in again on next request");
            token.lock().await.take();
        }

        Ok(response)
    }

    async fn create_node(&self, node: &NewNode) -> Result<()> {
        let builder = self.request(Method::POST, &self.nodes_url()).await?;
        let response = self.send(builder.json(node)).await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Map a non-success response to an error
///
/// iControl reports failures as `{"code": 400, "message": "..."}`; the
/// message is surfaced when present, the raw body otherwise.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::auth(format!(
            "Invalid credentials or insufficient permissions. Status: {}: {}",
            status, message
        ))),
        _ => Err(Error::api(status.as_u16(), message)),
    }
}

#[async_trait]
impl NodeApi for BigipClient {
    async fn create_static_node(&self, node: &NewNode) -> Result<()> {
        self.create_node(node).await
    }

    async fn create_fqdn_node(&self, node: &NewNode) -> Result<()> {
        if node.fqdn.is_none() {
            return Err(Error::invalid_input(format!(
                "FQDN node {} has no fqdn settings",
                node.name
            )));
        }
        self.create_node(node).await
    }

    async fn get_node(&self, name: &str) -> Result<Option<RemoteNode>> {
        let builder = self.request(Method::GET, &self.node_url(name)).await?;
        let response = self.send(builder).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let node = response
            .json::<RemoteNode>()
            .await
            .map_err(|e| Error::http(format!("Failed to parse node {}: {}", name, e)))?;
        Ok(Some(node))
    }

    async fn modify_node(&self, name: &str, modification: &NodeModification) -> Result<()> {
        let builder = self.request(Method::PUT, &self.node_url(name)).await?;
        let response = self.send(builder.json(modification)).await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &self.node_url(name)).await?;
        let response = self.send(builder).await?;
        check_status(response).await?;
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "bigip"
    }
}

/// Factory for creating BIG-IP clients
pub struct BigipFactory;

impl NodeApiFactory for BigipFactory {
    fn create(&self, config: &ApiConfig) -> Result<Box<dyn NodeApi>> {
        Ok(Box::new(BigipClient::from_config(config)?))
    }
}

/// Register the BIG-IP API with a registry
///
/// # Example
///
/// ```rust
/// use ltm_core::ApiRegistry;
///
/// let registry = ApiRegistry::new();
/// ltm_client_bigip::register(&registry);
/// assert!(registry.has_api("bigip"));
/// ```
pub fn register(registry: &ApiRegistry) {
    registry.register_api("bigip", Box::new(BigipFactory));
}
