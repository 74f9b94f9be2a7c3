//! [`StreamTransport`] binding over a persistent WebSocket connection.
//!
//! Calls are multiplexed on the connection and matched to their response by
//! JSON-RPC id. Server push frames are routed to the feed registered for their
//! subscription id.

use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use feed::FeedRouter;
use futures_util::{SinkExt, StreamExt};
use nodelink_core::{debug, trace, warn};
use nodelink_rpc_core::{
    api::transport::{RpcTransport, StreamTransport, TransportKind},
    error::{RpcError, RpcResult, TransportError, TransportResult},
    model::message::{Incoming, JsonRpcRequest, parse_incoming},
};
use parking_lot::Mutex;
use regex::Regex;
use resolver::IdResolver;
use serde_json::Value;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use triggered::{Listener, Trigger};

mod feed;
mod resolver;

const WS_CLIENT: &str = "ws-client";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct Inner {
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
    resolver: IdResolver,
    feeds: FeedRouter,
    outgoing: Sender<String>,
    closed: AtomicBool,
    shutdown_trigger: Trigger,
    shutdown_listener: Listener,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn timeout_check_interval(&self) -> Duration {
        (self.timeout / 10).clamp(Duration::from_millis(10), Duration::from_secs(1))
    }

    fn handle_text(&self, text: &str) {
        match parse_incoming(text) {
            Ok(frames) => {
                for frame in frames {
                    match frame {
                        Incoming::Response { id, outcome } => self.resolver.handle_response(id, outcome),
                        Incoming::Push { key, payload } => self.feeds.route(key, payload),
                    }
                }
            }
            Err(err) => warn!("[{}] ignoring undecodable frame: {}", WS_CLIENT, err),
        }
    }

    /// Marks the connection as gone: new calls are refused, pending ones fail and feeds close.
    fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("[{}] connection to {} closed", WS_CLIENT, self.url);
        self.shutdown_trigger.trigger();
        self.outgoing.close();
        self.resolver.fail_all(TransportError::Closed);
        self.feeds.close_all();
    }
}

#[derive(Clone, Debug)]
pub struct WsTransport {
    inner: Arc<Inner>,
}

impl WsTransport {
    pub async fn connect(url: impl Into<String>) -> RpcResult<Self> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Opens a connection to `url`, which must use the `ws` or `wss` scheme.
    ///
    /// `timeout` bounds the handshake and every subsequent call.
    pub async fn connect_with_timeout(url: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        let url = url.into();
        let schema = Regex::new(r"^wss?://").map_err(|err| RpcError::Configuration(err.to_string()))?;
        if !schema.is_match(&url) {
            return Err(RpcError::Configuration(format!("invalid WebSocket endpoint `{url}`, expected a ws:// or wss:// url")));
        }
        if timeout.is_zero() {
            return Err(RpcError::Configuration("request timeout must be greater than zero".to_string()));
        }

        let (stream, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        debug!("[{}] connected to {}", WS_CLIENT, url);

        let (outgoing, outgoing_receiver) = async_channel::unbounded();
        let (shutdown_trigger, shutdown_listener) = triggered::trigger();
        let inner = Arc::new(Inner {
            url,
            timeout,
            next_id: AtomicU64::new(1),
            resolver: IdResolver::new(),
            feeds: FeedRouter::new(),
            outgoing,
            closed: AtomicBool::new(false),
            shutdown_trigger,
            shutdown_listener,
            tasks: Mutex::new(Vec::new()),
        });

        let (write, read) = stream.split();
        let tasks = vec![
            tokio::spawn(Self::writer_task(inner.clone(), write, outgoing_receiver)),
            tokio::spawn(Self::reader_task(inner.clone(), read)),
            tokio::spawn(Self::timeout_monitor_task(inner.clone())),
        ];
        *inner.tasks.lock() = tasks;

        Ok(Self { inner })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    async fn writer_task<S>(inner: Arc<Inner>, mut write: S, outgoing: Receiver<String>)
    where
        S: futures_util::Sink<Message> + Unpin,
        S::Error: std::fmt::Display,
    {
        let shutdown = inner.shutdown_listener.clone();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                message = outgoing.recv() => match message {
                    Ok(text) => {
                        if let Err(err) = write.send(Message::Text(text)).await {
                            debug!("[{}] write failed: {}", WS_CLIENT, err);
                            break;
                        }
                    }
                    Err(_) => break,
                },
            }
        }
        let _ = write.close().await;
        trace!("[{}] terminating writer", WS_CLIENT);
        inner.teardown();
    }

    async fn reader_task<S, E>(inner: Arc<Inner>, mut read: S)
    where
        S: futures_util::Stream<Item = Result<Message, E>> + Unpin,
        E: std::fmt::Display,
    {
        let shutdown = inner.shutdown_listener.clone();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => inner.handle_text(&text),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => inner.handle_text(text),
                        Err(_) => warn!("[{}] ignoring non UTF-8 binary frame", WS_CLIENT),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("[{}] the server closed the connection", WS_CLIENT);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!("[{}] read failed: {}", WS_CLIENT, err);
                        break;
                    }
                },
            }
        }
        trace!("[{}] terminating reader", WS_CLIENT);
        inner.teardown();
    }

    /// Periodically fails the calls that waited longer than the request timeout.
    async fn timeout_monitor_task(inner: Arc<Inner>) {
        let shutdown = inner.shutdown_listener.clone();
        tokio::pin!(shutdown);
        let interval = inner.timeout_check_interval();
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => inner.resolver.remove_expired_requests(inner.timeout),
            }
        }
        trace!("[{}] terminating timeout monitor", WS_CLIENT);
    }
}

#[async_trait]
impl RpcTransport for WsTransport {
    async fn execute(&self, method: &str, params: Vec<Value>) -> TransportResult<Value> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let text = JsonRpcRequest::new(id, method, &params).to_json()?;

        let receiver = self.inner.resolver.register_request(id);
        // A teardown racing with the registration above may have drained the table already
        if self.inner.closed.load(Ordering::SeqCst) || self.inner.outgoing.try_send(text).is_err() {
            self.inner.resolver.cancel_request(id);
            return Err(TransportError::Closed);
        }
        trace!("[{}] {} #{} sent", WS_CLIENT, method, id);

        receiver.await.unwrap_or(Err(TransportError::Closed))
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    fn as_stream(self: Arc<Self>) -> Option<Arc<dyn StreamTransport>> {
        Some(self)
    }
}

#[async_trait]
impl StreamTransport for WsTransport {
    fn register_feed(&self, key: &str) -> Receiver<Value> {
        self.inner.feeds.register(key)
    }

    fn unregister_feed(&self, key: &str) {
        self.inner.feeds.unregister(key)
    }

    async fn close(&self) {
        self.inner.teardown();
        let tasks = std::mem::take(&mut *self.inner.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests;
