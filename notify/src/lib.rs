//! # Nodelink notify
//!
//! Named subscription handlers multiplexed to any number of independent subscribers.
//!
//! A [`SubscriptionManager`](manager::SubscriptionManager) maps subscription names to
//! [`HandlerFactory`](handler::HandlerFactory) instances. The first subscription to a name
//! starts a [`Handler`](handler::Handler) that feeds events into an [`Emitter`](handler::Emitter);
//! the emitter fans every event out to the [`Listener`](listener::Listener)s currently
//! subscribed to that name. The last unsubscription disposes the handler.

extern crate self as nodelink_notify;

pub mod connection;
pub mod error;
pub mod handler;
pub mod listener;
pub mod manager;

pub use connection::{CallbackConnection, ChannelConnection, Connection, DynConnection};
pub use handler::{DynHandler, DynHandlerFactory, Emitter, Handler, HandlerFactory};
pub use listener::{Listener, SubscriptionId};
pub use manager::SubscriptionManager;
