use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info};

use sidetree_types::{AnchoredOperation, ContentHash, Transaction};

use crate::connection::ConnectionString;
use crate::error::{StoreError, StoreResult};
use crate::traits::{OperationStore, TransactionStore};

/// Tracks whether a store has been brought online.
struct Lifecycle {
    name: String,
    initialized: AtomicBool,
}

impl Lifecycle {
    fn new(name: String) -> Self {
        Self {
            name,
            initialized: AtomicBool::new(false),
        }
    }

    fn mark_initialized(&self, kind: &str) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(store = %self.name, kind, "store initialized");
        }
    }

    fn ensure(&self) -> StoreResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized(self.name.clone()))
        }
    }
}

/// In-memory operation store for tests, local demos, and embedding.
pub struct InMemoryOperationStore {
    lifecycle: Lifecycle,
    operations: RwLock<HashMap<ContentHash, Vec<AnchoredOperation>>>,
}

impl InMemoryOperationStore {
    pub fn new(connection: &ConnectionString) -> Self {
        Self {
            lifecycle: Lifecycle::new(format!("{connection}/operations")),
            operations: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.initialized.load(Ordering::Acquire)
    }
}

#[async_trait]
impl OperationStore for InMemoryOperationStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.lifecycle.mark_initialized("operations");
        Ok(())
    }

    async fn put(&self, operations: Vec<AnchoredOperation>) -> StoreResult<()> {
        self.lifecycle.ensure()?;
        let mut map = self
            .operations
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let count = operations.len();
        for op in operations {
            let entry = map.entry(op.operation.did_unique_suffix).or_default();
            if let Err(idx) = entry.binary_search_by_key(&op.position(), AnchoredOperation::position) {
                entry.insert(idx, op);
            }
        }
        debug!(count, "operations stored");
        Ok(())
    }

    async fn get(&self, did_unique_suffix: &ContentHash) -> StoreResult<Vec<AnchoredOperation>> {
        self.lifecycle.ensure()?;
        let map = self
            .operations
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(did_unique_suffix).cloned().unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryOperationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOperationStore")
            .field("name", &self.lifecycle.name)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[derive(Default)]
struct TransactionState {
    processed: Vec<Transaction>,
    unresolvable: BTreeMap<u64, (Transaction, String)>,
}

/// In-memory transaction store for tests, local demos, and embedding.
pub struct InMemoryTransactionStore {
    lifecycle: Lifecycle,
    inner: RwLock<TransactionState>,
}

impl InMemoryTransactionStore {
    pub fn new(connection: &ConnectionString) -> Self {
        Self {
            lifecycle: Lifecycle::new(format!("{connection}/transactions")),
            inner: RwLock::new(TransactionState::default()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.initialized.load(Ordering::Acquire)
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.lifecycle.mark_initialized("transactions");
        Ok(())
    }

    async fn add_transaction(&self, transaction: Transaction) -> StoreResult<()> {
        self.lifecycle.ensure()?;
        let mut state = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(last) = state.processed.last() {
            if *last == transaction {
                return Ok(());
            }
            if transaction.transaction_number <= last.transaction_number {
                return Err(StoreError::OutOfOrder {
                    number: transaction.transaction_number,
                    last: last.transaction_number,
                });
            }
        }
        state.processed.push(transaction);
        Ok(())
    }

    async fn last_transaction(&self) -> StoreResult<Option<Transaction>> {
        self.lifecycle.ensure()?;
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.processed.last().cloned())
    }

    async fn transaction_count(&self) -> StoreResult<u64> {
        self.lifecycle.ensure()?;
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.processed.len() as u64)
    }

    async fn record_unresolvable(&self, transaction: Transaction, reason: &str) -> StoreResult<()> {
        self.lifecycle.ensure()?;
        let mut state = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        debug!(
            transaction_number = transaction.transaction_number,
            reason, "transaction recorded as unresolvable"
        );
        state
            .unresolvable
            .insert(transaction.transaction_number, (transaction, reason.to_string()));
        Ok(())
    }

    async fn unresolvable_transactions(&self) -> StoreResult<Vec<Transaction>> {
        self.lifecycle.ensure()?;
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.unresolvable.values().map(|(t, _)| t.clone()).collect())
    }
}

impl std::fmt::Debug for InMemoryTransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTransactionStore")
            .field("name", &self.lifecycle.name)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidetree_types::Operation;

    fn connection() -> ConnectionString {
        ConnectionString::parse("memory://test").unwrap()
    }

    fn transaction(number: u64) -> Transaction {
        Transaction {
            transaction_number: number,
            transaction_time: number * 10,
            anchor_string: format!("anchor-{number}"),
        }
    }

    fn anchored_create(number: u64, index: usize) -> AnchoredOperation {
        let body = serde_json::json!({ "type": "create", "document": { "n": number } });
        AnchoredOperation {
            operation: Operation::parse(body.to_string().as_bytes(), 2000).unwrap(),
            transaction_number: number,
            transaction_time: number * 10,
            index_in_batch: index,
        }
    }

    #[tokio::test]
    async fn operation_store_requires_initialize() {
        let store = InMemoryOperationStore::new(&connection());
        let op = anchored_create(1, 0);
        let suffix = op.operation.did_unique_suffix;
        assert!(matches!(
            store.put(vec![op.clone()]).await,
            Err(StoreError::NotInitialized(_))
        ));
        assert!(matches!(
            store.get(&suffix).await,
            Err(StoreError::NotInitialized(_))
        ));

        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
        store.put(vec![op.clone()]).await.unwrap();
        assert_eq!(store.get(&suffix).await.unwrap(), vec![op]);
    }

    #[tokio::test]
    async fn operation_store_orders_and_dedupes() {
        let store = InMemoryOperationStore::new(&connection());
        store.initialize().await.unwrap();

        let first = anchored_create(1, 0);
        let suffix = first.operation.did_unique_suffix;
        let mut later = first.clone();
        later.transaction_number = 5;
        let mut middle = first.clone();
        middle.transaction_number = 3;

        store.put(vec![later.clone(), first.clone()]).await.unwrap();
        store.put(vec![middle.clone(), first.clone()]).await.unwrap();

        let positions: Vec<_> = store
            .get(&suffix)
            .await
            .unwrap()
            .iter()
            .map(AnchoredOperation::position)
            .collect();
        assert_eq!(positions, vec![(1, 0), (3, 0), (5, 0)]);
    }

    #[tokio::test]
    async fn transaction_store_tracks_head() {
        let store = InMemoryTransactionStore::new(&connection());
        assert!(matches!(
            store.last_transaction().await,
            Err(StoreError::NotInitialized(_))
        ));
        store.initialize().await.unwrap();
        assert_eq!(store.last_transaction().await.unwrap(), None);

        store.add_transaction(transaction(1)).await.unwrap();
        store.add_transaction(transaction(2)).await.unwrap();
        store.add_transaction(transaction(2)).await.unwrap();
        assert_eq!(store.transaction_count().await.unwrap(), 2);
        assert_eq!(store.last_transaction().await.unwrap(), Some(transaction(2)));

        assert_eq!(
            store.add_transaction(transaction(1)).await,
            Err(StoreError::OutOfOrder { number: 1, last: 2 })
        );
    }

    #[tokio::test]
    async fn unresolvable_kept_alongside_cursor() {
        let store = InMemoryTransactionStore::new(&connection());
        store.initialize().await.unwrap();

        store
            .record_unresolvable(transaction(4), "not found")
            .await
            .unwrap();
        store.add_transaction(transaction(4)).await.unwrap();

        assert_eq!(
            store.unresolvable_transactions().await.unwrap(),
            vec![transaction(4)]
        );
        assert_eq!(store.last_transaction().await.unwrap(), Some(transaction(4)));
    }
}
