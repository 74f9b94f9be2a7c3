use crate::{
    connection::DynConnection,
    error::{Error, Result},
    handler::{DynHandler, DynHandlerFactory, Emitter},
    listener::{Listener, SubscriptionId},
};
use indexmap::IndexSet;
use nodelink_core::{debug, trace, warn};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Latest event of a handler instance. Holding the lock serializes emissions
/// with the replay given to late joiners.
type Latest<M> = Arc<ReentrantMutex<RefCell<Option<M>>>>;

/// A running handler and the listeners it feeds, in subscription order.
struct Active<M> {
    instance: u64,
    handler: DynHandler<M>,
    members: IndexSet<SubscriptionId>,
    latest: Latest<M>,
}

struct State<M> {
    listeners: HashMap<SubscriptionId, Arc<Listener<M>>>,
    handlers: HashMap<Arc<str>, Active<M>>,
}

impl<M> Default for State<M> {
    fn default() -> Self {
        Self { listeners: HashMap::new(), handlers: HashMap::new() }
    }
}

pub(crate) struct Inner<M> {
    /// Name of the manager, used in logs
    name: &'static str,
    factories: RwLock<HashMap<String, DynHandlerFactory<M>>>,
    state: Mutex<State<M>>,
    last_id: AtomicU64,
    last_instance: AtomicU64,
}

impl<M> Inner<M>
where
    M: Clone,
{
    fn latest_of(&self, name: &str, instance: u64) -> Option<Latest<M>> {
        self.state.lock().handlers.get(name).filter(|active| active.instance == instance).map(|active| active.latest.clone())
    }

    pub(crate) fn fan_out(&self, name: &str, instance: u64, message: M) -> bool {
        let Some(latest) = self.latest_of(name, instance) else {
            trace!("[{}] discarding an event of disposed handler `{name}` #{instance}", self.name);
            return false;
        };
        let latest = latest.lock();
        let listeners = {
            let state = self.state.lock();
            match state.handlers.get(name) {
                Some(active) if active.instance == instance => {
                    active.members.iter().filter_map(|id| state.listeners.get(id).cloned()).collect::<Vec<_>>()
                }
                _ => return false,
            }
        };
        latest.replace(Some(message.clone()));
        // Listeners unsubscribed since the snapshot was taken are closed and drop the message
        for listener in listeners {
            listener.deliver(message.clone());
        }
        true
    }

    pub(crate) fn is_instance_active(&self, name: &str, instance: u64) -> bool {
        self.state.lock().handlers.get(name).is_some_and(|active| active.instance == instance)
    }

    /// Drops the handler instance and closes the listeners it feeds.
    ///
    /// Returns `false` if the instance was already disposed.
    pub(crate) fn discard_instance(&self, name: &str, instance: u64) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if !state.handlers.get(name).is_some_and(|active| active.instance == instance) {
                return false;
            }
            let members = state.handlers.remove(name).map(|active| active.members).unwrap_or_default();
            members.iter().filter_map(|id| state.listeners.remove(id)).collect::<Vec<_>>()
        };
        debug!("[{}] discarding handler `{name}` #{instance} and {} subscriptions", self.name, listeners.len());
        listeners.iter().for_each(|listener| {
            listener.close();
        });
        true
    }
}

/// Registry of named subscription handlers and of the listeners currently subscribed to them.
///
/// Identifiers are allocated from a monotonic counter and never reused by the same manager.
pub struct SubscriptionManager<M> {
    inner: Arc<Inner<M>>,
}

impl<M> SubscriptionManager<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                factories: RwLock::new(HashMap::new()),
                state: Mutex::new(State::default()),
                last_id: AtomicU64::new(0),
                last_instance: AtomicU64::new(0),
            }),
        }
    }

    /// Registers the handler factory serving subscriptions to `name`.
    pub fn register(&self, name: impl Into<String>, factory: DynHandlerFactory<M>) -> Result<()> {
        let name = name.into();
        let mut factories = self.inner.factories.write();
        if factories.contains_key(&name) {
            return Err(Error::DuplicateHandler(name));
        }
        trace!("[{}] registering handler `{name}`", self.inner.name);
        factories.insert(name, factory);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.factories.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names = self.inner.factories.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Subscribes `connection` to the feed `name` and returns the new subscription identifier.
    ///
    /// The handler of `name` is started if this is its first listener, otherwise the
    /// running handler is shared and its latest event, if any, is replayed to `connection`.
    ///
    /// If the handler fails to start, the subscriber that triggered it gets
    /// [`Error::HandlerStart`]. A subscriber that joined the instance while it was
    /// starting already got its identifier: its connection is closed instead and
    /// [`SubscriptionManager::is_subscribed`] reports it as gone. The same happens to
    /// every listener of an instance retired through [`Emitter::retire`].
    pub fn subscribe(&self, name: &str, connection: DynConnection<M>) -> Result<SubscriptionId> {
        let factory = self.inner.factories.read().get(name).cloned().ok_or_else(|| Error::UnknownSubscription(name.to_string()))?;
        let id = self.inner.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let listener = Arc::new(Listener::new(id, name, connection));

        // Joining a running handler happens under its emission lock so the replayed
        // latest event cannot overtake a concurrent emission
        let joined = self.inner.state.lock().handlers.get(name).map(|active| active.latest.clone());
        let joined_guard = joined.as_ref().map(|latest| latest.lock());

        let (starting, replay) = {
            let mut state = self.inner.state.lock();
            let (starting, replay) = match state.handlers.get_mut(name) {
                Some(active) => {
                    active.members.insert(id);
                    let replay = match (&joined, &joined_guard) {
                        (Some(latest), Some(guard)) if Arc::ptr_eq(latest, &active.latest) => guard.borrow().clone(),
                        _ => None,
                    };
                    (None, replay)
                }
                None => {
                    let handler = factory.create(name)?;
                    let instance = self.inner.last_instance.fetch_add(1, Ordering::SeqCst) + 1;
                    let key: Arc<str> = Arc::from(name);
                    let active = Active { instance, handler: handler.clone(), members: IndexSet::from([id]), latest: Arc::new(ReentrantMutex::new(RefCell::new(None))) };
                    state.handlers.insert(key.clone(), active);
                    (Some((key, instance, handler)), None)
                }
            };
            state.listeners.insert(id, listener.clone());
            (starting, replay)
        };

        if let Some(message) = replay {
            trace!("[{}] replaying the latest `{name}` event to subscription {id}", self.inner.name);
            listener.deliver(message);
        }
        drop(joined_guard);

        // The handler is started outside of the state lock so it may emit right away
        if let Some((key, instance, handler)) = starting {
            debug!("[{}] starting handler `{name}` #{instance}", self.inner.name);
            let emitter = Emitter::new(key, instance, Arc::downgrade(&self.inner));
            if let Err(err) = handler.clone().start(emitter) {
                warn!("[{}] handler `{name}` #{instance} failed to start: {err}", self.inner.name);
                self.inner.discard_instance(name, instance);
                return Err(Error::HandlerStart(name.to_string(), err.to_string()));
            }
        }
        trace!("[{}] subscription {id} to `{name}` registered", self.inner.name);
        Ok(id)
    }

    /// Cancels a subscription. Unknown or already cancelled identifiers are ignored.
    ///
    /// On return the subscription's connection is guaranteed to receive no further message.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let (listener, disposed) = {
            let mut state = self.inner.state.lock();
            let Some(listener) = state.listeners.remove(&id) else {
                trace!("[{}] unsubscribe ignored: unknown subscription {id}", self.inner.name);
                return;
            };
            let mut disposed = None;
            if let Some(active) = state.handlers.get_mut(listener.name()) {
                active.members.shift_remove(&id);
                if active.members.is_empty() {
                    disposed = state.handlers.remove(listener.name()).map(|active| (active.instance, active.handler));
                }
            }
            (listener, disposed)
        };
        listener.close();
        trace!("[{}] subscription {id} to `{}` cancelled", self.inner.name, listener.name());
        if let Some((instance, handler)) = disposed {
            debug!("[{}] disposing handler `{}` #{instance}", self.inner.name, listener.name());
            handler.stop();
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.state.lock().listeners.contains_key(&id)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Returns `true` if a handler instance currently serves `name`.
    pub fn is_handler_active(&self, name: &str) -> bool {
        self.inner.state.lock().handlers.contains_key(name)
    }

    /// Cancels every subscription and disposes every running handler.
    pub fn shutdown(&self) {
        let (listeners, handlers) = {
            let mut state = self.inner.state.lock();
            let state = std::mem::take(&mut *state);
            (state.listeners, state.handlers)
        };
        debug!("[{}] shutting down {} subscriptions and {} handlers", self.inner.name, listeners.len(), handlers.len());
        listeners.values().for_each(|listener| {
            listener.close();
        });
        handlers.into_values().for_each(|active| active.handler.stop());
    }
}

impl<M> Clone for SubscriptionManager<M> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<M> Debug for SubscriptionManager<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager").field("name", &self.inner.name).finish_non_exhaustive()
    }
}
