//! # Nodelink core
//!
//! Ambient primitives shared by every nodelink crate: the logger and its macros,
//! the [`AsyncService`](task::service::AsyncService) lifecycle trait and the
//! [`TickService`](task::tick::TickService) timer used by polling components.

extern crate self as nodelink_core;

pub mod log;
pub mod task;
