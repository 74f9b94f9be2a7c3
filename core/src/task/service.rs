use futures_util::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service {0} is already running")]
    AlreadyStarted(&'static str),

    #[error("service {0} is not running")]
    NotRunning(&'static str),

    #[error("{0}")]
    General(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

pub type AsyncServiceFuture = BoxFuture<'static, ServiceResult<()>>;

/// A long running component with an explicit lifecycle.
///
/// `start` resolves when the service exits, `signal_exit` requests termination and
/// `stop` performs the final cleanup once the service exited.
pub trait AsyncService: Send + Sync {
    fn ident(self: Arc<Self>) -> &'static str;
    fn start(self: Arc<Self>) -> AsyncServiceFuture;
    fn signal_exit(self: Arc<Self>);
    fn stop(self: Arc<Self>) -> AsyncServiceFuture;
}
