/// Errors from operation and transaction store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection string could not be parsed.
    #[error("invalid connection string `{0}`")]
    InvalidConnectionString(String),

    /// The connection string names a backend this build does not provide.
    #[error("unsupported store backend `{0}`")]
    UnsupportedBackend(String),

    /// The store was used before `initialize` completed.
    #[error("store `{0}` used before initialization")]
    NotInitialized(String),

    /// The backend failed to come online.
    #[error("failed to initialize store `{name}`: {reason}")]
    InitializationFailed { name: String, reason: String },

    /// A transaction was added behind the current head.
    #[error("transaction {number} is not after the last stored transaction {last}")]
    OutOfOrder { number: u64, last: u64 },

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
