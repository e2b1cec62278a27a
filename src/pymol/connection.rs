//! Connection to PyMOL's XML-RPC listener.
//!
//! PyMOL auto-increments its RPC port when the default is taken by another
//! instance, so [`PymolConnection::connect`] walks a small window of ports and
//! adopts the first one that answers `ping()`. The adopted handle is set once
//! and shared read-only afterwards; there is no reconnection.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use super::xmlrpc::{self, XmlValue};
use crate::config::EndpointConfig;
use crate::error::{BridgeError, RpcError};

/// Only bounds TCP connection establishment while probing; calls themselves
/// have no timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

// ── Remote endpoint seam ────────────────────────────────────────────────────

/// Something that can execute a named remote call with positional arguments.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    async fn call(&self, method: &str, params: &[XmlValue]) -> Result<XmlValue, RpcError>;
}

/// Opens a client handle for a candidate URL. Opening never touches the
/// network; the liveness probe does.
pub trait Connector: Send + Sync {
    fn open(&self, url: &str) -> Arc<dyn RemoteEndpoint>;
}

/// XML-RPC over HTTP POST.
pub struct XmlRpcEndpoint {
    url: String,
    client: Client,
}

impl XmlRpcEndpoint {
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl RemoteEndpoint for XmlRpcEndpoint {
    async fn call(&self, method: &str, params: &[XmlValue]) -> Result<XmlValue, RpcError> {
        let body = xmlrpc::encode_call(method, params);
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        xmlrpc::decode_response(&bytes)
    }
}

/// Default connector: one shared `reqwest::Client` for every candidate.
pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("PyMOL: falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self { client }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for HttpConnector {
    fn open(&self, url: &str) -> Arc<dyn RemoteEndpoint> {
        Arc::new(XmlRpcEndpoint::new(url, self.client.clone()))
    }
}

// ── Connection manager ──────────────────────────────────────────────────────

struct Adopted {
    url: String,
    endpoint: Arc<dyn RemoteEndpoint>,
}

/// Owns the endpoint configuration and, once connected, the adopted handle.
pub struct PymolConnection {
    config: EndpointConfig,
    connector: Arc<dyn Connector>,
    adopted: OnceLock<Adopted>,
}

impl PymolConnection {
    pub fn new(config: EndpointConfig) -> Self {
        Self::with_connector(config, Arc::new(HttpConnector::new()))
    }

    pub fn with_connector(config: EndpointConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            adopted: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.adopted.get().is_some()
    }

    /// URL of the adopted endpoint, if any.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.adopted.get().map(|a| a.url.as_str())
    }

    /// Probe `base_port ..= base_port + 4` in order and adopt the first
    /// candidate whose `ping()` succeeds. Later candidates are not touched.
    /// Returns `true` immediately if a handle was already adopted.
    pub async fn connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }

        for port in self.config.candidate_ports() {
            let url = self.config.url_for(port);
            let endpoint = self.connector.open(&url);
            match endpoint.call("ping", &[]).await {
                Ok(_) => {
                    tracing::info!("PyMOL: connected to XML-RPC server at {}", url);
                    // A concurrent connect may have won; either handle is live.
                    let _ = self.adopted.set(Adopted { url, endpoint });
                    return true;
                }
                Err(e) => {
                    tracing::debug!(port, "PyMOL: probe failed: {}", e);
                }
            }
        }

        false
    }

    /// Forward one call to the adopted endpoint.
    pub async fn invoke(&self, method: &str, params: &[XmlValue]) -> Result<XmlValue, BridgeError> {
        let adopted = self.adopted.get().ok_or(BridgeError::NotConnected)?;
        tracing::debug!(method, "PyMOL: forwarding call");
        Ok(adopted.endpoint.call(method, params).await?)
    }
}
