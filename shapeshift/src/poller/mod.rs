//! Deposit status poller
//!
//! Tracks deposit addresses by polling a [`StatusSource`] on a fixed interval. Every
//! observation is delivered to the tracked item's connection; an item is dropped as
//! soon as a terminal observation (complete or failed) has been delivered.
//!
//! All mutation of the tracked table and every delivery happen under one reentrant
//! lock, so once [`Poller::unsubscribe`] returns nothing more is delivered for that
//! item, and a connection may unsubscribe from within its own delivery.

use crate::{
    config::PollerConfig,
    error::{Error, Result},
    model::DepositStatus,
};
use arena::Arena;
use async_trait::async_trait;
use futures::future::join_all;
use nodelink_core::{
    debug,
    task::{
        service::{AsyncService, AsyncServiceFuture, ServiceError},
        tick::{TickReason, TickService},
    },
    trace, warn,
};
use nodelink_notify::connection::{CallbackConnection, DynConnection};
use parking_lot::{Mutex, ReentrantMutex};
use std::{
    cell::RefCell,
    fmt::Debug,
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::task::JoinHandle;

mod arena;
mod event;

pub use arena::TrackingHandle;
pub use event::{Phase, ShiftEvent};

const POLLER: &str = "shift-poller";

/// Answers the status of one tracked key.
#[async_trait]
pub trait StatusSource: Debug + Send + Sync {
    async fn deposit_status(&self, key: &str) -> Result<DepositStatus>;
}

pub type DynStatusSource = Arc<dyn StatusSource>;

#[derive(Debug)]
struct TrackedItem {
    key: String,
    connection: DynConnection<ShiftEvent>,
    phase: Phase,
    /// Sequence number of the latest query issued for this item
    issued: u64,
    /// Sequence number of the latest response applied to this item
    applied: u64,
}

type Table = ReentrantMutex<RefCell<Arena<TrackedItem>>>;

struct Inner {
    source: DynStatusSource,
    config: PollerConfig,
    table: Table,
    tick: Mutex<Option<Arc<TickService>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(tick) = self.tick.get_mut().take() {
            tick.shutdown();
        }
    }
}

/// Tracks deposits until they settle.
///
/// Clones share the same table. Dropping the last clone stops a running loop.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

impl Poller {
    pub fn new(source: DynStatusSource, config: PollerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                source,
                config,
                table: ReentrantMutex::new(RefCell::new(Arena::default())),
                tick: Mutex::new(None),
                task: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Starts tracking `key`, delivering every observation to `connection`.
    pub fn subscribe(&self, key: impl Into<String>, connection: DynConnection<ShiftEvent>) -> TrackingHandle {
        let key = key.into();
        let table = self.inner.table.lock();
        let handle = table.borrow_mut().insert(TrackedItem { key: key.clone(), connection, phase: Phase::Pending, issued: 0, applied: 0 });
        debug!("[{}] tracking {} as {:?}", POLLER, key, handle);
        handle
    }

    pub fn subscribe_callback<F>(&self, key: impl Into<String>, callback: F) -> TrackingHandle
    where
        F: Fn(ShiftEvent) + Send + Sync + 'static,
    {
        self.subscribe(key, Arc::new(CallbackConnection::new(callback)))
    }

    /// Stops tracking. Stale or unknown handles are ignored.
    ///
    /// A query already in flight for the item is not cancelled; its result is discarded.
    pub fn unsubscribe(&self, handle: TrackingHandle) {
        let table = self.inner.table.lock();
        let removed = table.borrow_mut().remove(handle);
        match removed {
            Some(item) => debug!("[{}] untracking {}", POLLER, item.key),
            None => trace!("[{}] unsubscribe ignored: {:?} is not tracked", POLLER, handle),
        }
    }

    pub fn phase(&self, handle: TrackingHandle) -> Option<Phase> {
        self.inner.table.lock().borrow().get(handle).map(|item| item.phase)
    }

    pub fn is_tracked(&self, handle: TrackingHandle) -> bool {
        self.phase(handle).is_some()
    }

    pub fn tracked_count(&self) -> usize {
        self.inner.table.lock().borrow().len()
    }

    /// Untracks every item.
    pub fn clear(&self) {
        let table = self.inner.table.lock();
        let drained = table.borrow_mut().drain();
        debug!("[{}] untracked {} items", POLLER, drained.len());
    }

    /// Runs one poll cycle: queries every tracked item concurrently and applies the results.
    ///
    /// A failed query only affects its own item, which is told about it and stays tracked.
    pub async fn poll_once(&self) {
        let batch = self.issue_batch();
        if batch.is_empty() {
            return;
        }
        trace!("[{}] polling {} items", POLLER, batch.len());
        let source = &self.inner.source;
        let outcomes = join_all(batch.into_iter().map(|(handle, key, sequence)| async move {
            let outcome = source.deposit_status(&key).await;
            (handle, key, sequence, outcome)
        }))
        .await;
        for (handle, key, sequence, outcome) in outcomes {
            self.apply(handle, &key, sequence, outcome);
        }
    }

    fn issue_batch(&self) -> Vec<(TrackingHandle, String, u64)> {
        let table = self.inner.table.lock();
        let mut arena = table.borrow_mut();
        arena
            .iter_mut()
            .map(|(handle, item)| {
                item.issued += 1;
                (handle, item.key.clone(), item.issued)
            })
            .collect()
    }

    fn apply(&self, handle: TrackingHandle, key: &str, sequence: u64, outcome: Result<DepositStatus>) {
        let table = self.inner.table.lock();
        let delivery = {
            let mut arena = table.borrow_mut();
            let Some(item) = arena.get_mut(handle) else {
                trace!("[{}] discarding the status of untracked {}", POLLER, key);
                return;
            };
            if sequence <= item.applied {
                trace!("[{}] discarding a stale status of {} (#{} <= #{})", POLLER, key, sequence, item.applied);
                return;
            }
            item.applied = sequence;

            let event = match outcome {
                Ok(status) => ShiftEvent::from_status(status),
                Err(err) => {
                    warn!("[{}] status of {} unavailable: {}", POLLER, key, err);
                    ShiftEvent::Unreachable(err.to_string())
                }
            };
            if event.is_terminal() {
                debug!("[{}] {} reached a terminal status", POLLER, key);
                arena.remove(handle).map(|item| (event, item.connection))
            } else {
                if !matches!(event, ShiftEvent::Unreachable(_)) {
                    item.phase = Phase::Observed;
                }
                Some((event, item.connection.clone()))
            }
        };
        // Delivered while the table lock is held, see the module docs
        if let Some((event, connection)) = delivery {
            if let Err(err) = connection.send(event) {
                warn!("[{}] delivery to the tracker of {} failed: {}", POLLER, key, err);
            }
        }
        drop(table);
    }

    fn begin(&self) -> Result<Arc<TickService>> {
        let mut slot = self.inner.tick.lock();
        if slot.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let tick = Arc::new(TickService::new());
        *slot = Some(tick.clone());
        Ok(tick)
    }

    /// Schedules a cycle every interval until the tick service shuts down or the poller is dropped.
    ///
    /// Cycles run in their own task, so a slow cycle may overlap the next one.
    async fn run(inner: Weak<Inner>, tick: Arc<TickService>, interval: Duration) {
        debug!("[{}] polling every {:?}", POLLER, interval);
        while tick.tick(interval).await == TickReason::Wakeup {
            let Some(inner) = inner.upgrade() else { break };
            let poller = Poller { inner };
            tokio::spawn(async move { poller.poll_once().await });
        }
        if let Some(inner) = inner.upgrade() {
            let mut slot = inner.tick.lock();
            if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &tick)) {
                *slot = None;
            }
        }
        debug!("[{}] polling stopped", POLLER);
    }

    /// Spawns the polling loop. The first cycle runs one interval after the start.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| Error::General(err.to_string()))?;
        let tick = self.begin()?;
        let handle = runtime.spawn(Self::run(Arc::downgrade(&self.inner), tick, self.inner.config.interval));
        *self.inner.task.lock() = Some(handle);
        Ok(())
    }

    /// Stops scheduling cycles and waits for the loop to exit. Cycles in flight complete.
    pub async fn stop(&self) -> Result<()> {
        let tick = self.inner.tick.lock().take().ok_or(Error::AlreadyStopped)?;
        tick.shutdown();
        let task = self.inner.task.lock().take();
        if let Some(task) = task {
            task.await.map_err(|err| Error::General(err.to_string()))?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.tick.lock().is_some()
    }
}

impl Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.inner.source)
            .field("interval", &self.inner.config.interval)
            .field("tracked", &self.tracked_count())
            .finish()
    }
}

impl AsyncService for Poller {
    fn ident(self: Arc<Self>) -> &'static str {
        POLLER
    }

    fn start(self: Arc<Self>) -> AsyncServiceFuture {
        Box::pin(async move {
            let tick = self.begin().map_err(|_| ServiceError::AlreadyStarted(POLLER))?;
            Self::run(Arc::downgrade(&self.inner), tick, self.inner.config.interval).await;
            Ok(())
        })
    }

    fn signal_exit(self: Arc<Self>) {
        if let Some(tick) = self.inner.tick.lock().as_ref() {
            tick.shutdown();
        }
    }

    fn stop(self: Arc<Self>) -> AsyncServiceFuture {
        Box::pin(async move { Ok(()) })
    }
}
