//! Transport contracts
//!
//! A transport moves one JSON-RPC exchange at a time to a remote endpoint.
//! Transports able to carry server-initiated push frames additionally
//! implement [`StreamTransport`] and advertise it through
//! [`RpcTransport::as_stream`].

use crate::error::TransportResult;
use async_channel::Receiver;
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// One-shot request/response exchanges only
    Request,
    /// Persistent connection carrying push frames as well
    Stream,
}

#[async_trait]
pub trait RpcTransport: Debug + Send + Sync {
    /// Sends `method` with positional `params` and resolves to the remote `result`.
    ///
    /// A remote `error` object resolves to [`TransportError::Remote`](crate::TransportError::Remote).
    async fn execute(&self, method: &str, params: Vec<Value>) -> TransportResult<Value>;

    fn kind(&self) -> TransportKind {
        TransportKind::Request
    }

    fn as_stream(self: Arc<Self>) -> Option<Arc<dyn StreamTransport>> {
        None
    }
}

pub type DynRpcTransport = Arc<dyn RpcTransport>;

#[async_trait]
pub trait StreamTransport: RpcTransport {
    /// Opens a feed receiving the payloads of push frames addressed to `key`.
    ///
    /// Registering an already registered key replaces the previous feed, which gets closed.
    fn register_feed(&self, key: &str) -> Receiver<Value>;

    /// Closes and forgets the feed of `key`. Unknown keys are ignored.
    fn unregister_feed(&self, key: &str);

    /// Tears the connection down. Pending calls fail with
    /// [`TransportError::Closed`](crate::TransportError::Closed) and every feed is closed.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

pub type DynStreamTransport = Arc<dyn StreamTransport>;
