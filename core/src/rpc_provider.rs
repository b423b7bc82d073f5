use alloy::providers::{PendingTransactionError, ProviderBuilder, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::reqwest as node_http;
use alloy::transports::TransportError;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ── Configuration constants ───────────────────────────────────────────────────

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC request failed: {0}")]
    RequestFailed(String),

    #[error("RPC node timeout")]
    Timeout,

    #[error("HTTP {0}")]
    Http(u16),

    /// Error object returned by the node or wallet. The message is kept
    /// verbatim so it can be surfaced to the user as-is.
    #[error("{message}")]
    Node { code: i64, message: String },

    #[error("Unexpected response to {method}: {details}")]
    InvalidResponse { method: String, details: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RpcError {
    pub fn invalid_response(method: &str, details: impl ToString) -> Self {
        Self::InvalidResponse {
            method: method.to_string(),
            details: details.to_string(),
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Node {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => Self::RequestFailed(err.to_string()),
        }
    }
}

impl From<PendingTransactionError> for RpcError {
    fn from(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(e) => e.into(),
            other => Self::RequestFailed(other.to_string()),
        }
    }
}

// ── Types ─────────────────────────────────────────────────────────────────────

/// A single JSON-RPC endpoint with optional authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcProvider {
    /// Human-readable label (e.g. "hoodi-node", "wallet").
    pub name: String,
    /// Full JSON-RPC URL.
    pub url: String,
    /// Optional authentication header name (e.g. "Authorization", "X-API-Key").
    #[serde(default)]
    pub auth_header: Option<String>,
    /// Optional authentication header value (e.g. "Bearer <token>", "<api-key>").
    #[serde(default)]
    pub auth_value: Option<String>,
}

impl RpcProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            auth_header: None,
            auth_value: None,
        }
    }

    pub fn with_auth(mut self, header: Option<String>, value: Option<String>) -> Self {
        self.auth_header = header;
        self.auth_value = value;
        self
    }

    /// Alloy provider for this endpoint. The auth header rides on every
    /// request; `poll_interval` paces receipt and block polling.
    pub fn connect_node(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<RootProvider, RpcError> {
        let mut headers = node_http::header::HeaderMap::new();
        if let (Some(header), Some(value)) = (&self.auth_header, &self.auth_value) {
            let name = node_http::header::HeaderName::from_bytes(header.as_bytes())
                .map_err(|e| RpcError::InvalidEndpoint(format!("{header}: {e}")))?;
            let value = node_http::header::HeaderValue::from_str(value)
                .map_err(|e| RpcError::InvalidEndpoint(format!("{header}: {e}")))?;
            headers.insert(name, value);
        }

        let http = node_http::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::InvalidEndpoint(e.to_string()))?;
        let url: node_http::Url = self
            .url
            .parse()
            .map_err(|e| RpcError::InvalidEndpoint(format!("{}: {e}", self.url)))?;

        tracing::debug!(provider = %self.name, url = %self.url, "Connecting node provider");
        let client = RpcClient::new_http_with_client(http, url).with_poll_interval(poll_interval);
        Ok(ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(client))
    }
}

/// Anything that answers EIP-1193 style `request(method, params)` calls.
///
/// The injected wallet is reached through this seam, which lets the flows
/// be driven by a scripted transport in tests.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RpcError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RpcError>> + Send {
        self.as_ref().request(method, params)
    }
}

/// Issue a request and deserialize its `result` into `R`.
pub async fn request_as<R: DeserializeOwned>(
    transport: &impl Transport,
    method: &str,
    params: Value,
) -> Result<R, RpcError> {
    let value = transport.request(method, params).await?;
    serde_json::from_value(value).map_err(|e| RpcError::invalid_response(method, e))
}

// ── JSON-RPC envelopes ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Value,
    #[serde(flatten)]
    result: ResponseResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseResult {
    Error { error: RpcErrorObject },
    Success { result: Value },
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    #[allow(dead_code)]
    data: Option<Value>,
}

// ── HTTP transport ────────────────────────────────────────────────────────────

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    provider: RpcProvider,
    client: Client,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(provider: RpcProvider) -> Self {
        Self {
            provider,
            client: Client::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(
            provider = %self.provider.name,
            method,
            "Sending JSON-RPC request to {}",
            self.provider.url
        );

        let mut req = self.client.post(&self.provider.url).json(&body);

        if let (Some(header), Some(value)) = (&self.provider.auth_header, &self.provider.auth_value)
        {
            req = req.header(header.as_str(), value.as_str());
        }

        let response = tokio::time::timeout(self.request_timeout, req.send())
            .await
            .map_err(|_| RpcError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout
                } else if e.is_connect() {
                    RpcError::Network(e)
                } else {
                    RpcError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(RpcError::Http(response.status().as_u16()));
        }

        let envelope: JsonRpcResponse = response.json().await?;
        match envelope.result {
            ResponseResult::Success { result } => Ok(result),
            ResponseResult::Error { error } => {
                tracing::debug!(
                    provider = %self.provider.name,
                    method,
                    code = error.code,
                    "Node returned an error: {}",
                    error.message
                );
                Err(RpcError::Node {
                    code: error.code,
                    message: error.message,
                })
            }
        }
    }
}

// ── Scripted transport for tests ──────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────
