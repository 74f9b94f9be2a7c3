//! # Nodelink Shapeshift
//!
//! A client of the Shapeshift exchange HTTP API and a [`Poller`](poller::Poller) tracking
//! deposit addresses until their exchange reaches a terminal status.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;

pub use client::ShapeshiftClient;
pub use config::{PollerConfig, ShapeshiftConfig};
pub use error::{Error, Result};
pub use model::{DepositStatus, Status};
pub use poller::{Phase, Poller, ShiftEvent, StatusSource, TrackingHandle};
