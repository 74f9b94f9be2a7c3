use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The exchange answered with an `error` field
    #[error("Exchange error: {0}")]
    Api(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Poller is already started")]
    AlreadyStarted,

    #[error("Poller is already stopped")]
    AlreadyStopped,

    #[error("{0}")]
    General(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() { Error::Decode(err.to_string()) } else { Error::Http(err.to_string()) }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::General(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
