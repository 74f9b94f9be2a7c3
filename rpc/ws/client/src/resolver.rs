use nodelink_core::trace;
use nodelink_rpc_core::error::{TransportError, TransportResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::oneshot;

pub(crate) type ResponseReceiver = oneshot::Receiver<TransportResult<Value>>;
type ResponseSender = oneshot::Sender<TransportResult<Value>>;

#[derive(Debug)]
struct Pending {
    timestamp: Instant,
    sender: ResponseSender,
}

impl Pending {
    fn new(sender: ResponseSender) -> Self {
        Self { timestamp: Instant::now(), sender }
    }

    fn resolve(self, id: u64, outcome: TransportResult<Value>) {
        if self.sender.send(outcome).is_err() {
            trace!("[Resolver] the caller of request {} is gone", id);
        }
    }
}

/// Table of in-flight calls keyed by request id.
#[derive(Debug, Default)]
pub(crate) struct IdResolver {
    pending_calls: Mutex<HashMap<u64, Pending>>,
}

impl IdResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_request(&self, id: u64) -> ResponseReceiver {
        let (sender, receiver) = oneshot::channel();
        self.pending_calls.lock().insert(id, Pending::new(sender));
        receiver
    }

    pub(crate) fn cancel_request(&self, id: u64) {
        self.pending_calls.lock().remove(&id);
    }

    pub(crate) fn handle_response(&self, id: u64, outcome: TransportResult<Value>) {
        let pending = self.pending_calls.lock().remove(&id);
        match pending {
            Some(pending) => pending.resolve(id, outcome),
            None => trace!("[Resolver] response id {} has no pending request", id),
        }
    }

    /// Fails every call pending for longer than `timeout`.
    pub(crate) fn remove_expired_requests(&self, timeout: Duration) {
        let expired: Vec<(u64, Pending)> = {
            let mut pending_calls = self.pending_calls.lock();
            let ids: Vec<u64> = pending_calls.iter().filter(|(_, pending)| pending.timestamp.elapsed() > timeout).map(|(id, _)| *id).collect();
            ids.into_iter().filter_map(|id| pending_calls.remove(&id).map(|pending| (id, pending))).collect()
        };
        for (id, pending) in expired {
            trace!("[Resolver] request {} timed out", id);
            pending.resolve(id, Err(TransportError::Timeout(timeout)));
        }
    }

    /// Fails every pending call with `err`.
    pub(crate) fn fail_all(&self, err: TransportError) {
        let drained: Vec<(u64, Pending)> = self.pending_calls.lock().drain().collect();
        for (id, pending) in drained {
            pending.resolve(id, Err(err.clone()));
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending_calls.lock().len()
    }
}
