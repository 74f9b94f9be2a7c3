//! Request/response [`RpcTransport`] binding over HTTP POST.
//!
//! Every exchange is an independent JSON-RPC 2.0 request. The transport has no
//! push capability, so subscriptions over it are served by polling handlers.

use async_trait::async_trait;
use nodelink_core::trace;
use nodelink_rpc_core::{
    api::transport::{RpcTransport, TransportKind},
    error::{RpcError, RpcResult, TransportError, TransportResult},
    model::message::{JsonRpcRequest, JsonRpcResponse},
};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

const HTTP_CLIENT: &str = "http-client";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct Inner {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    inner: Arc<Inner>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> RpcResult<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Builds a transport targeting `url`, which must use the `http` or `https` scheme.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        let url = url.into();
        let schema = Regex::new(r"^https?://").map_err(|err| RpcError::Configuration(err.to_string()))?;
        if !schema.is_match(&url) {
            return Err(RpcError::Configuration(format!("invalid HTTP endpoint `{url}`, expected an http:// or https:// url")));
        }
        if timeout.is_zero() {
            return Err(RpcError::Configuration("request timeout must be greater than zero".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|err| RpcError::Configuration(err.to_string()))?;
        Ok(Self { inner: Arc::new(Inner { url, client, timeout, next_id: AtomicU64::new(1) }) })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.inner.timeout)
        } else if err.is_decode() || err.is_body() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn execute(&self, method: &str, params: Vec<Value>) -> TransportResult<Value> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let body = JsonRpcRequest::new(id, method, &params).to_json()?;
        trace!("[{}] {} #{} -> {}", HTTP_CLIENT, method, id, self.inner.url);

        let response = self
            .inner
            .client
            .post(&self.inner.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| self.map_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Unavailable(format!("endpoint answered with HTTP status {status}")));
        }

        let text = response.text().await.map_err(|err| self.map_error(err))?;
        trace!("[{}] {} #{} <- {} bytes", HTTP_CLIENT, method, id, text.len());
        decode_response(id, &text)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Request
    }
}

/// Decodes the body answering request `id`.
fn decode_response(id: u64, body: &str) -> TransportResult<Value> {
    let response: JsonRpcResponse = serde_json::from_str(body)?;
    match response.id() {
        Some(received) if received != id => {
            Err(TransportError::Protocol(format!("response id {received} does not match request id {id}")))
        }
        // Some endpoints answer failed requests with a null id
        _ => response.into_result(),
    }
}
