use thiserror::Error;

use sidetree_clients::ClientError;
use sidetree_store::StoreError;
use sidetree_types::{ConfigError, OperationError, ProtocolError};

/// Errors surfaced by core construction, initialization, and the
/// collaborators it wires together.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("protocol parameter error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} already started")]
    AlreadyStarted(&'static str),

    #[error("core must be constructed inside a tokio runtime")]
    NoRuntime,

    #[error("core is already initialized")]
    AlreadyInitialized,

    #[error("a previous initialization failed; the core must be rebuilt")]
    InitializationFailed,

    #[error("core has been shut down")]
    Stopped,

    #[error("download manager is not running")]
    DownloadManagerStopped,
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned to callers of the request handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("node is not ready to serve requests")]
    NotReady,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OperationError> for HandlerError {
    fn from(e: OperationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<CoreError> for HandlerError {
    fn from(e: CoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
