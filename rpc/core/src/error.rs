use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`TransportError`], convenient for matching
/// without destructuring the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    Unavailable,
    Remote,
    Timeout,
    Closed,
    Protocol,
}

/// Failure of a single remote exchange.
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String, data: Option<Value> },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport is closed")]
    Closed,

    #[error("malformed exchange: {0}")]
    Protocol(String),
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Unavailable(_) => TransportErrorKind::Unavailable,
            TransportError::Remote { .. } => TransportErrorKind::Remote,
            TransportError::Timeout(_) => TransportErrorKind::Timeout,
            TransportError::Closed => TransportErrorKind::Closed,
            TransportError::Protocol(_) => TransportErrorKind::Protocol,
        }
    }

    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        TransportError::Remote { code, message: message.into(), data: None }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Protocol(err.to_string())
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Clone, Debug, Error)]
pub enum RpcError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unknown subscription {0}")]
    UnknownSubscription(String),

    #[error(transparent)]
    Notification(#[from] nodelink_notify::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    General(String),
}

impl RpcError {
    /// The underlying transport failure, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            RpcError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Serialization(err.to_string())
    }
}

impl From<String> for RpcError {
    fn from(value: String) -> Self {
        RpcError::General(value)
    }
}

impl From<&str> for RpcError {
    fn from(value: &str) -> Self {
        RpcError::General(value.to_string())
    }
}

pub type RpcResult<T> = std::result::Result<T, crate::RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_kind() {
        assert_eq!(TransportError::Closed.kind(), TransportErrorKind::Closed);
        assert_eq!(TransportError::remote(-32601, "method not found").kind(), TransportErrorKind::Remote);
        assert_eq!(TransportError::Timeout(Duration::from_secs(1)).kind(), TransportErrorKind::Timeout);

        let err: RpcError = TransportError::Unavailable("connection refused".into()).into();
        assert_eq!(err.transport().map(TransportError::kind), Some(TransportErrorKind::Unavailable));
        assert!(RpcError::from("boom").transport().is_none());
    }

    #[test]
    fn test_remote_error_display() {
        let err = TransportError::remote(-32000, "insufficient funds");
        assert_eq!(err.to_string(), "remote error -32000: insufficient funds");
    }
}
