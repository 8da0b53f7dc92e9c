use async_trait::async_trait;

use sidetree_types::{AnchoredOperation, ContentHash, Transaction};

use crate::error::StoreResult;

/// Store of anchored DID operations.
///
/// All implementations must satisfy these invariants:
/// - Construction performs no I/O; `initialize` opens the backend.
/// - Every other call fails with `NotInitialized` until `initialize` succeeds.
/// - `put` is idempotent per (transaction number, index in batch).
/// - `get` returns operations in chain order.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Bring the store online. Safe to call more than once.
    async fn initialize(&self) -> StoreResult<()>;

    /// Persist a group of anchored operations.
    async fn put(&self, operations: Vec<AnchoredOperation>) -> StoreResult<()>;

    /// All operations for a DID, ordered by chain position.
    async fn get(&self, did_unique_suffix: &ContentHash) -> StoreResult<Vec<AnchoredOperation>>;
}

/// Store of processed anchoring transactions.
///
/// The last stored transaction is the observer's resume cursor.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Bring the store online. Safe to call more than once.
    async fn initialize(&self) -> StoreResult<()>;

    /// Record a processed transaction. Numbers must strictly increase;
    /// re-adding the current head is a no-op.
    async fn add_transaction(&self, transaction: Transaction) -> StoreResult<()>;

    async fn last_transaction(&self) -> StoreResult<Option<Transaction>>;

    async fn transaction_count(&self) -> StoreResult<u64>;

    /// Record a transaction whose batch file could not be fetched or parsed.
    async fn record_unresolvable(&self, transaction: Transaction, reason: &str) -> StoreResult<()>;

    async fn unresolvable_transactions(&self) -> StoreResult<Vec<Transaction>>;
}
