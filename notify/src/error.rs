use async_channel::{RecvError, SendError, TrySendError};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Error: {0}")]
    General(String),

    #[error("unknown subscription `{0}`")]
    UnknownSubscription(String),

    #[error("subscription handler `{0}` failed to start: {1}")]
    HandlerStart(String, String),

    #[error("subscription handler `{0}` is already registered")]
    DuplicateHandler(String),

    #[error("channel receive error")]
    ChannelRecvError,

    #[error("channel send error")]
    ChannelSendError,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("object already stopped")]
    AlreadyStoppedError,
}

impl<T> From<SendError<T>> for Error {
    fn from(_: SendError<T>) -> Self {
        Error::ChannelSendError
    }
}

impl<T> From<TrySendError<T>> for Error {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Closed(_) => Error::ConnectionClosed,
            TrySendError::Full(_) => Error::ChannelSendError,
        }
    }
}

impl From<RecvError> for Error {
    fn from(_: RecvError) -> Self {
        Error::ChannelRecvError
    }
}

pub type Result<T> = std::result::Result<T, Error>;
