use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid service address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unsupported service scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("invalid content address `{0}`")]
    InvalidContentAddress(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("client lock poisoned")]
    LockPoisoned,
}

pub type ClientResult<T> = Result<T, ClientError>;
