//! # RPC Core
//!
//! Foundational primitives shared by the Nodelink transports and the API facade:
//! the [`RpcTransport`](api::transport::RpcTransport) and
//! [`StreamTransport`](api::transport::StreamTransport) contracts, JSON-RPC 2.0
//! message framing, the error taxonomy and one client type per remote
//! method namespace.
//!

pub mod api;
pub mod error;
pub mod model;
pub mod namespace;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub mod prelude {
    //! Re-exports of the most commonly used types and traits in this crate.
    pub use super::api::transport::*;
    pub use super::error::*;
    pub use super::model::*;
    pub use super::namespace::*;
}

pub use api::transport::*;
pub use error::*;
pub use model::*;
