use crate::event::SubscriptionEvent;
use nodelink_core::{
    debug,
    task::tick::{TickReason, TickService},
    trace, warn,
};
use nodelink_notify::{
    error::{Error as NotifyError, Result as NotifyResult},
    handler::{Emitter, Handler},
};
use nodelink_rpc_core::{api::transport::DynRpcTransport, error::TransportError};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Polls a parameterless remote method and emits its result whenever it changes.
///
/// The first observation is always emitted. Failed polls are emitted as error events
/// and polling goes on.
#[derive(Debug)]
pub struct PollingHandler {
    method: String,
    transport: DynRpcTransport,
    interval: Duration,
    timeout: Duration,
    tick: Arc<TickService>,
}

impl PollingHandler {
    pub fn new(method: impl Into<String>, transport: DynRpcTransport, interval: Duration, timeout: Duration) -> Self {
        Self { method: method.into(), transport, interval, timeout, tick: Arc::new(TickService::new()) }
    }

    async fn poll(&self) -> SubscriptionEvent {
        match tokio::time::timeout(self.timeout, self.transport.execute(&self.method, vec![])).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn run(self: Arc<Self>, emitter: Emitter<SubscriptionEvent>) {
        let mut last: Option<Value> = None;
        loop {
            let keep_going = match self.poll().await {
                Ok(value) if last.as_ref() == Some(&value) => emitter.is_active(),
                Ok(value) => {
                    last = Some(value.clone());
                    emitter.emit(Ok(value))
                }
                Err(err) => {
                    warn!("polling `{}` failed: {}", self.method, err);
                    emitter.emit(Err(err))
                }
            };
            if !keep_going {
                break;
            }
            if self.tick.tick(self.interval).await == TickReason::Shutdown {
                break;
            }
        }
        trace!("polling of `{}` terminated", self.method);
    }
}

impl Handler<SubscriptionEvent> for PollingHandler {
    fn start(self: Arc<Self>, emitter: Emitter<SubscriptionEvent>) -> NotifyResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| NotifyError::General(err.to_string()))?;
        debug!("start polling `{}` every {:?}", self.method, self.interval);
        runtime.spawn(self.run(emitter));
        Ok(())
    }

    fn stop(self: Arc<Self>) {
        debug!("stop polling `{}`", self.method);
        self.tick.shutdown();
    }
}
