use super::service::{AsyncService, AsyncServiceFuture};
use std::{sync::Arc, time::Duration};
use tokio::select;
use triggered::{Listener, Trigger, trigger};

const TICK: &str = "tick";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickReason {
    Wakeup,
    Shutdown,
}

/// A timer that can be interrupted by a shutdown signal.
///
/// Timing relies on `tokio::time`, so a paused tokio clock drives it deterministically.
#[derive(Debug)]
pub struct TickService {
    shutdown_trigger: Trigger,
    shutdown_listener: Listener,
}

impl TickService {
    pub fn new() -> Self {
        let (shutdown_trigger, shutdown_listener) = trigger();
        Self { shutdown_trigger, shutdown_listener }
    }

    /// Waits until `duration` has elapsed or the service is shut down, whichever comes first.
    pub async fn tick(&self, duration: Duration) -> TickReason {
        if self.shutdown_listener.is_triggered() {
            return TickReason::Shutdown;
        }
        let shutdown_listener = self.shutdown_listener.clone();
        select! {
            biased;
            _ = shutdown_listener => TickReason::Shutdown,
            _ = tokio::time::sleep(duration) => TickReason::Wakeup,
        }
    }

    pub fn shutdown(&self) {
        self.shutdown_trigger.trigger();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_listener.is_triggered()
    }
}

impl Default for TickService {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncService for TickService {
    fn ident(self: Arc<Self>) -> &'static str {
        TICK
    }

    fn start(self: Arc<Self>) -> AsyncServiceFuture {
        Box::pin(async move { Ok(()) })
    }

    fn signal_exit(self: Arc<Self>) {
        self.shutdown();
    }

    fn stop(self: Arc<Self>) -> AsyncServiceFuture {
        Box::pin(async move { Ok(()) })
    }
}
