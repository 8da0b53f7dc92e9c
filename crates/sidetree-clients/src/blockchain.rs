use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use sidetree_types::Transaction;

use crate::endpoint::ServiceEndpoint;
use crate::error::{ClientError, ClientResult};

/// One page of anchoring transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadResult {
    /// `true` if more transactions follow this page.
    pub more_transactions: bool,
    pub transactions: Vec<Transaction>,
}

/// Client for the blockchain service that anchors batch addresses.
#[async_trait]
pub trait BlockchainClient: Send + Sync {
    /// Anchor a batch-file address in a new transaction.
    async fn write(&self, anchor_string: &str) -> ClientResult<()>;

    /// Transactions after `since` (or from the start when `None`), at most
    /// `limit` per page, in transaction-number order.
    async fn read(&self, since: Option<u64>, limit: usize) -> ClientResult<ReadResult>;

    /// Current blockchain time, used to select protocol parameters.
    async fn time(&self) -> ClientResult<u64>;
}

/// In-process blockchain: every anchor lands in its own block.
pub struct LocalBlockchain {
    endpoint: ServiceEndpoint,
    transactions: RwLock<Vec<Transaction>>,
}

impl LocalBlockchain {
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        Self {
            endpoint,
            transactions: RwLock::new(Vec::new()),
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl BlockchainClient for LocalBlockchain {
    async fn write(&self, anchor_string: &str) -> ClientResult<()> {
        let mut txs = self
            .transactions
            .write()
            .map_err(|_| ClientError::LockPoisoned)?;
        let next = txs.len() as u64 + 1;
        txs.push(Transaction {
            transaction_number: next,
            transaction_time: next,
            anchor_string: anchor_string.to_string(),
        });
        debug!(endpoint = %self.endpoint, transaction_number = next, "anchor written");
        Ok(())
    }

    async fn read(&self, since: Option<u64>, limit: usize) -> ClientResult<ReadResult> {
        let txs = self
            .transactions
            .read()
            .map_err(|_| ClientError::LockPoisoned)?;
        let start = since.map_or(0, |n| txs.partition_point(|t| t.transaction_number <= n));
        let remaining = &txs[start..];
        let page = remaining.iter().take(limit).cloned().collect::<Vec<_>>();
        Ok(ReadResult {
            more_transactions: remaining.len() > page.len(),
            transactions: page,
        })
    }

    async fn time(&self) -> ClientResult<u64> {
        let txs = self
            .transactions
            .read()
            .map_err(|_| ClientError::LockPoisoned)?;
        Ok(txs.len() as u64)
    }
}

impl std::fmt::Debug for LocalBlockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBlockchain")
            .field("endpoint", &self.endpoint.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> LocalBlockchain {
        LocalBlockchain::new(ServiceEndpoint::parse("memory://chain").unwrap())
    }

    #[tokio::test]
    async fn writes_advance_time() {
        let chain = chain();
        assert_eq!(chain.time().await.unwrap(), 0);
        chain.write("a").await.unwrap();
        chain.write("b").await.unwrap();
        assert_eq!(chain.time().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reads_page_after_cursor() {
        let chain = chain();
        for anchor in ["a", "b", "c"] {
            chain.write(anchor).await.unwrap();
        }

        let first = chain.read(None, 2).await.unwrap();
        assert!(first.more_transactions);
        assert_eq!(first.transactions.len(), 2);
        assert_eq!(first.transactions[0].anchor_string, "a");

        let rest = chain.read(Some(2), 2).await.unwrap();
        assert!(!rest.more_transactions);
        assert_eq!(rest.transactions.len(), 1);
        assert_eq!(rest.transactions[0].transaction_number, 3);

        let none = chain.read(Some(3), 2).await.unwrap();
        assert!(none.transactions.is_empty());
    }
}
