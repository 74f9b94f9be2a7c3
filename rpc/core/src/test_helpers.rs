//! Scripted transports for tests of the layers above the transport.

use crate::{
    api::transport::{RpcTransport, StreamTransport, TransportKind},
    error::{TransportError, TransportResult},
};
use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Request transport answering from per-method queues.
///
/// When a method queue holds a single entry that entry is sticky and answers every
/// further call. Unscripted methods resolve to `null`. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<TransportResult<Value>>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `outcome` as the next answer to `method`.
    pub fn respond(&self, method: &str, outcome: TransportResult<Value>) {
        self.scripts.lock().entry(method.to_string()).or_default().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }

    fn answer(&self, method: &str, params: Vec<Value>) -> TransportResult<Value> {
        self.calls.lock().push((method.to_string(), params));
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn execute(&self, method: &str, params: Vec<Value>) -> TransportResult<Value> {
        self.answer(method, params)
    }
}

/// Stream transport on top of [`MockTransport`] whose feeds are driven by [`MockStreamTransport::push`].
#[derive(Debug, Default)]
pub struct MockStreamTransport {
    inner: MockTransport,
    feeds: Mutex<HashMap<String, Sender<Value>>>,
    closed: AtomicBool,
}

impl MockStreamTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, outcome: TransportResult<Value>) {
        self.inner.respond(method, outcome)
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.inner.calls()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner.call_count(method)
    }

    /// Delivers `payload` to the feed of `key`, returning false when no feed is registered.
    pub fn push(&self, key: &str, payload: Value) -> bool {
        let sender = self.feeds.lock().get(key).cloned();
        sender.is_some_and(|sender| sender.try_send(payload).is_ok())
    }

    pub fn has_feed(&self, key: &str) -> bool {
        self.feeds.lock().contains_key(key)
    }
}

#[async_trait]
impl RpcTransport for MockStreamTransport {
    async fn execute(&self, method: &str, params: Vec<Value>) -> TransportResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.answer(method, params)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    fn as_stream(self: Arc<Self>) -> Option<Arc<dyn StreamTransport>> {
        Some(self)
    }
}

#[async_trait]
impl StreamTransport for MockStreamTransport {
    fn register_feed(&self, key: &str) -> Receiver<Value> {
        let (sender, receiver) = async_channel::unbounded();
        if let Some(previous) = self.feeds.lock().insert(key.to_string(), sender) {
            previous.close();
        }
        receiver
    }

    fn unregister_feed(&self, key: &str) {
        if let Some(sender) = self.feeds.lock().remove(key) {
            sender.close();
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.feeds.lock().drain().for_each(|(_, sender)| {
            sender.close();
        });
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
