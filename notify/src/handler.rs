use crate::{error::Result, manager::Inner};
use std::{
    fmt::Debug,
    sync::{Arc, Weak},
};

/// An upstream feed behind a subscription name.
///
/// A handler is started when the first listener subscribes to its name and stopped once
/// the last one unsubscribes. Events must be emitted sequentially through the provided
/// [`Emitter`] so that every listener observes them in the same order.
pub trait Handler<M>: Debug + Send + Sync {
    fn start(self: Arc<Self>, emitter: Emitter<M>) -> Result<()>;
    fn stop(self: Arc<Self>);
}

pub type DynHandler<M> = Arc<dyn Handler<M>>;

/// Builds a fresh [`Handler`] each time a subscription name becomes active.
pub trait HandlerFactory<M>: Send + Sync {
    fn create(&self, name: &str) -> Result<DynHandler<M>>;
}

pub type DynHandlerFactory<M> = Arc<dyn HandlerFactory<M>>;

impl<M, F> HandlerFactory<M> for F
where
    F: Fn(&str) -> Result<DynHandler<M>> + Send + Sync,
{
    fn create(&self, name: &str) -> Result<DynHandler<M>> {
        self(name)
    }
}

/// Publishing handle given to a running [`Handler`].
///
/// An emitter is bound to one handler instance; once that instance is disposed
/// every emission is discarded and `emit` returns `false`.
pub struct Emitter<M> {
    name: Arc<str>,
    instance: u64,
    router: Weak<Inner<M>>,
}

impl<M> Emitter<M>
where
    M: Clone,
{
    pub(crate) fn new(name: Arc<str>, instance: u64, router: Weak<Inner<M>>) -> Self {
        Self { name, instance, router }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fans `message` out to every listener of the handler.
    ///
    /// Returns `false` when the handler is no longer active and should wind down.
    pub fn emit(&self, message: M) -> bool {
        match self.router.upgrade() {
            Some(router) => router.fan_out(&self.name, self.instance, message),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.router.upgrade().is_some_and(|router| router.is_instance_active(&self.name, self.instance))
    }

    /// Disposes the handler instance from within, closing every listener it feeds.
    ///
    /// The next subscription to the name starts a fresh instance. The handler is not
    /// stopped: it is expected to wind down on its own.
    pub fn retire(&self) {
        if let Some(router) = self.router.upgrade() {
            router.discard_instance(&self.name, self.instance);
        }
    }
}

impl<M> Clone for Emitter<M> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), instance: self.instance, router: self.router.clone() }
    }
}

impl<M> Debug for Emitter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("name", &self.name).field("instance", &self.instance).finish()
    }
}

pub mod test_helpers {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A handler driven by hand: tests grab its emitter and publish at will.
    #[derive(Debug)]
    pub struct ManualHandler<M> {
        emitter: Mutex<Option<Emitter<M>>>,
        pub starts: AtomicUsize,
        pub stops: AtomicUsize,
    }

    impl<M> ManualHandler<M>
    where
        M: Clone,
    {
        pub fn new() -> Self {
            Self { emitter: Mutex::new(None), starts: AtomicUsize::new(0), stops: AtomicUsize::new(0) }
        }

        pub fn emitter(&self) -> Option<Emitter<M>> {
            self.emitter.lock().clone()
        }

        pub fn emit(&self, message: M) -> bool {
            self.emitter().is_some_and(|emitter| emitter.emit(message))
        }

        pub fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        pub fn stops(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }
    }

    impl<M> Handler<M> for ManualHandler<M>
    where
        M: Clone + Debug + Send + Sync + 'static,
    {
        fn start(self: Arc<Self>, emitter: Emitter<M>) -> Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            *self.emitter.lock() = Some(emitter);
            Ok(())
        }

        fn stop(self: Arc<Self>) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.emitter.lock().take();
        }
    }

    /// A factory always returning the same shared [`ManualHandler`].
    pub fn shared_factory<M>(handler: Arc<ManualHandler<M>>) -> DynHandlerFactory<M>
    where
        M: Clone + Debug + Send + Sync + 'static,
    {
        Arc::new(move |_: &str| -> Result<DynHandler<M>> { Ok(handler.clone()) })
    }
}
