//! # Nodelink API
//!
//! [`Api`] is the single entry point over one transport: it exposes a client per remote
//! method namespace, a subscription manager served by built-in handlers, and a helper
//! binding contract descriptions to an address.

pub mod api;
pub mod config;
pub mod contract;
pub mod event;
pub mod handlers;

pub use api::Api;
pub use config::ApiConfig;
pub use contract::Contract;
pub use event::SubscriptionEvent;
