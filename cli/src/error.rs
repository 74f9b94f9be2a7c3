use nodelink_rpc_core::error::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no command given")]
    MissingCommand,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Exchange(#[from] nodelink_shapeshift::Error),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
