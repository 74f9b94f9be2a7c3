use crate::connection::DynConnection;
use nodelink_core::trace;
use parking_lot::ReentrantMutex;
use std::{cell::Cell, fmt::Debug};

pub type SubscriptionId = u64;

/// A subscriber of a named feed.
///
/// Deliveries and closing are serialized by a gate: once [`Listener::close`] returns,
/// no further message reaches the connection. The gate is reentrant so a connection may
/// close its own listener from within a delivery.
pub struct Listener<M> {
    id: SubscriptionId,
    name: String,
    connection: DynConnection<M>,
    gate: ReentrantMutex<Cell<bool>>,
}

impl<M> Listener<M> {
    pub fn new(id: SubscriptionId, name: impl Into<String>, connection: DynConnection<M>) -> Self {
        Self { id, name: name.into(), connection, gate: ReentrantMutex::new(Cell::new(true)) }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends `message` to the connection unless the listener is closed.
    ///
    /// Returns `true` if the message was handed to the connection.
    pub fn deliver(&self, message: M) -> bool {
        let gate = self.gate.lock();
        if !gate.get() {
            trace!("[Listener {}] dropping message for closed subscription `{}`", self.id, self.name);
            return false;
        }
        match self.connection.send(message) {
            Ok(()) => true,
            Err(err) => {
                trace!("[Listener {}] connection of `{}` refused a message: {err}", self.id, self.name);
                false
            }
        }
    }

    /// Closes the listener, waiting for any delivery in progress on another thread.
    ///
    /// Returns `true` if the listener was open.
    pub fn close(&self) -> bool {
        let gate = self.gate.lock();
        let was_open = gate.replace(false);
        if was_open {
            self.connection.close();
        }
        was_open
    }

    pub fn is_open(&self) -> bool {
        self.gate.lock().get()
    }
}

impl<M> Debug for Listener<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).field("name", &self.name).field("connection", &self.connection).finish()
    }
}
