use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors found while loading or validating node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while installing or querying protocol parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("at least one protocol version is required")]
    NoVersions,

    #[error("protocol versions must have strictly ascending starting times: {previous} is followed by {next}")]
    UnorderedVersions { previous: u64, next: u64 },

    #[error("protocol version starting at {starting_blockchain_time} has a zero `{field}`")]
    ZeroLimit {
        starting_blockchain_time: u64,
        field: &'static str,
    },

    #[error("no protocol version is in force at blockchain time {0}")]
    NoVersionForTime(u64),

    #[error("failed to load protocol versions: {0}")]
    Load(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced while parsing DID operations and batch files.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("operation is {size} bytes, exceeding the maximum of {max}")]
    TooLarge { size: usize, max: usize },

    #[error("malformed operation: {0}")]
    Malformed(String),

    #[error("{operation} operation is missing `{field}`")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("{operation} operation document must not set reserved key `{field}`")]
    ReservedField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("malformed batch file: {0}")]
    MalformedBatch(String),
}

pub type OperationResult<T> = Result<T, OperationError>;
