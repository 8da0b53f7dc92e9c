use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sidetree_clients::{BlockchainClient, FetchResult};
use sidetree_store::TransactionStore;
use sidetree_types::{BatchFile, ConfigError, Transaction};

use crate::background::LoopHandle;
use crate::download::DownloadManager;
use crate::error::{CoreError, CoreResult};
use crate::processor::OperationProcessor;

/// Transactions requested from the blockchain per read.
const PAGE_SIZE: usize = 100;

/// Scans the blockchain for anchoring transactions and feeds their batch
/// files to the operation processor.
pub struct Observer {
    blockchain: Arc<dyn BlockchainClient>,
    download_manager: Arc<DownloadManager>,
    processor: Arc<OperationProcessor>,
    transaction_store: Arc<dyn TransactionStore>,
    interval: Duration,
    started: AtomicBool,
    /// Number of the last processed transaction. Held for a whole scan, so
    /// scans never overlap.
    cursor: Mutex<Option<u64>>,
}

impl Observer {
    pub fn new(
        blockchain: Arc<dyn BlockchainClient>,
        download_manager: Arc<DownloadManager>,
        processor: Arc<OperationProcessor>,
        transaction_store: Arc<dyn TransactionStore>,
        interval: Duration,
    ) -> CoreResult<Self> {
        if interval.is_zero() {
            return Err(ConfigError::invalid("observing_interval_in_seconds", "must be positive").into());
        }
        Ok(Self {
            blockchain,
            download_manager,
            processor,
            transaction_store,
            interval,
            started: AtomicBool::new(false),
            cursor: Mutex::new(None),
        })
    }

    /// Whether the periodic loop has been armed.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Resume from the transaction store's cursor and arm the periodic scan.
    ///
    /// Fails without arming anything if the transaction store cannot be read.
    pub async fn start_periodic_processing(self: &Arc<Self>) -> CoreResult<LoopHandle> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AlreadyStarted("observer"));
        }
        let last = match self.transaction_store.last_transaction().await {
            Ok(last) => last.map(|tx| tx.transaction_number),
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e.into());
            }
        };
        *self.cursor.lock().await = last;
        info!(
            interval_secs = self.interval.as_secs_f64(),
            resume_after = ?last,
            "periodic processing started"
        );

        let observer = Arc::clone(self);
        Ok(LoopHandle::spawn_periodic("observer", self.interval, move || {
            let observer = Arc::clone(&observer);
            async move {
                match observer.process_transactions().await {
                    Ok(0) => {}
                    Ok(processed) => debug!(processed, "observer scan complete"),
                    Err(e) => warn!(error = %e, "observer scan failed"),
                }
            }
        }))
    }

    /// Process every transaction after the cursor. Returns how many were
    /// processed.
    pub async fn process_transactions(&self) -> CoreResult<usize> {
        let mut cursor = self.cursor.lock().await;
        let mut processed = 0;
        loop {
            let page = self.blockchain.read(*cursor, PAGE_SIZE).await?;
            if page.transactions.is_empty() {
                break;
            }
            for transaction in page.transactions {
                let number = transaction.transaction_number;
                self.process_transaction(&transaction).await?;
                self.transaction_store.add_transaction(transaction).await?;
                *cursor = Some(number);
                processed += 1;
            }
            if !page.more_transactions {
                break;
            }
        }
        Ok(processed)
    }

    async fn process_transaction(&self, transaction: &Transaction) -> CoreResult<()> {
        let reason = match self.download_manager.download(&transaction.anchor_string).await {
            Ok(FetchResult::Found(bytes)) => match BatchFile::from_bytes(&bytes) {
                Ok(batch) => match self.processor.process_batch(transaction, &batch).await {
                    Ok(_) => return Ok(()),
                    Err(CoreError::Protocol(e)) => e.to_string(),
                    Err(e) => return Err(e),
                },
                Err(e) => e.to_string(),
            },
            Ok(FetchResult::NotFound) => "batch file not found".to_string(),
            Err(CoreError::Client(e)) => e.to_string(),
            Err(e) => return Err(e),
        };
        warn!(
            transaction_number = transaction.transaction_number,
            anchor = %transaction.anchor_string,
            %reason,
            "transaction unresolvable"
        );
        self.transaction_store
            .record_unresolvable(transaction.clone(), &reason)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sidetree_clients::{CasClient, LocalBlockchain, LocalCas, ServiceEndpoint};
    use sidetree_store::{
        ConnectionString, InMemoryOperationStore, InMemoryTransactionStore, OperationStore, StoreError,
    };
    use sidetree_types::{ContentHash, Operation, ProtocolParameters, ProtocolVersion};

    use crate::batch_writer::BatchWriter;

    struct Fixture {
        chain: Arc<LocalBlockchain>,
        cas: Arc<LocalCas>,
        transactions: Arc<InMemoryTransactionStore>,
        processor: Arc<OperationProcessor>,
        observer: Arc<Observer>,
        protocol: Arc<ProtocolParameters>,
        _downloads: LoopHandle,
    }

    async fn fixture(initialize_stores: bool) -> Fixture {
        fixture_with_versions(
            initialize_stores,
            vec![ProtocolVersion {
                starting_blockchain_time: 0,
                max_operations_per_batch: 10,
                max_operation_byte_size: 1000,
            }],
        )
        .await
    }

    async fn fixture_with_versions(initialize_stores: bool, versions: Vec<ProtocolVersion>) -> Fixture {
        let chain = Arc::new(LocalBlockchain::new(ServiceEndpoint::parse("memory://chain").unwrap()));
        let cas = Arc::new(LocalCas::new(ServiceEndpoint::parse("memory://cas").unwrap()));
        let connection = ConnectionString::parse("memory://observer").unwrap();
        let operations = Arc::new(InMemoryOperationStore::new(&connection));
        let transactions = Arc::new(InMemoryTransactionStore::new(&connection));
        if initialize_stores {
            operations.initialize().await.unwrap();
            transactions.initialize().await.unwrap();
        }
        let protocol = ProtocolParameters::initialize(versions).unwrap();
        let processor =
            Arc::new(OperationProcessor::new("did:sidetree:", operations, protocol.clone()).unwrap());
        let downloads = Arc::new(DownloadManager::new(4, cas.clone()).unwrap());
        let download_loop = downloads.start().unwrap();
        let observer = Arc::new(
            Observer::new(
                chain.clone(),
                downloads,
                processor.clone(),
                transactions.clone(),
                Duration::from_millis(10),
            )
            .unwrap(),
        );
        Fixture {
            chain,
            cas,
            transactions,
            processor,
            observer,
            protocol,
            _downloads: download_loop,
        }
    }

    fn create(tag: &str) -> Operation {
        let body = json!({ "type": "create", "document": { "tag": tag } }).to_string();
        Operation::parse(body.as_bytes(), 1000).unwrap()
    }

    #[tokio::test]
    async fn zero_interval_is_config_error() {
        let f = fixture(true).await;
        let downloads = Arc::new(DownloadManager::new(1, f.cas.clone()).unwrap());
        let err = Observer::new(
            f.chain.clone(),
            downloads,
            f.processor.clone(),
            f.transactions.clone(),
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue {
                field: "observing_interval_in_seconds",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn processes_anchored_batches_and_advances_cursor() {
        let f = fixture(true).await;
        let writer = BatchWriter::new(
            f.chain.clone(),
            f.cas.clone(),
            Duration::from_secs(60),
            f.protocol.clone(),
        )
        .unwrap();
        let op = create("observed");
        writer.add(op.clone());
        writer.write_batch().await.unwrap();

        assert_eq!(f.observer.process_transactions().await.unwrap(), 1);
        assert_eq!(f.observer.process_transactions().await.unwrap(), 0);
        assert_eq!(f.transactions.transaction_count().await.unwrap(), 1);

        let doc = f.processor.resolve(&op.did_unique_suffix).await.unwrap().unwrap();
        assert_eq!(doc.content["tag"], "observed");
    }

    #[tokio::test]
    async fn pages_through_long_histories() {
        let f = fixture(true).await;
        let address = f.cas.write(&BatchFile::default().to_bytes()).await.unwrap();
        for _ in 0..(PAGE_SIZE + 5) {
            f.chain.write(&address).await.unwrap();
        }
        assert_eq!(f.observer.process_transactions().await.unwrap(), PAGE_SIZE + 5);
        let last = f.transactions.last_transaction().await.unwrap().unwrap();
        assert_eq!(last.transaction_number, (PAGE_SIZE + 5) as u64);
    }

    #[tokio::test]
    async fn missing_and_malformed_batches_are_unresolvable() {
        let f = fixture(true).await;
        f.chain.write(&ContentHash::of(b"never stored").to_hex()).await.unwrap();
        let junk = f.cas.write(b"not a batch file").await.unwrap();
        f.chain.write(&junk).await.unwrap();

        assert_eq!(f.observer.process_transactions().await.unwrap(), 2);
        let unresolvable = f.transactions.unresolvable_transactions().await.unwrap();
        assert_eq!(unresolvable.len(), 2);
        assert_eq!(f.transactions.transaction_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn transactions_before_first_version_are_unresolvable() {
        let f = fixture_with_versions(
            true,
            vec![ProtocolVersion {
                starting_blockchain_time: 3,
                max_operations_per_batch: 10,
                max_operation_byte_size: 1000,
            }],
        )
        .await;
        let address = f.cas.write(&BatchFile::default().to_bytes()).await.unwrap();
        for _ in 0..5 {
            f.chain.write(&address).await.unwrap();
        }

        assert_eq!(f.observer.process_transactions().await.unwrap(), 5);
        assert_eq!(f.observer.process_transactions().await.unwrap(), 0);
        let unresolvable = f.transactions.unresolvable_transactions().await.unwrap();
        assert_eq!(unresolvable.len(), 2);
        assert_eq!(f.transactions.transaction_count().await.unwrap(), 5);
        let last = f.transactions.last_transaction().await.unwrap().unwrap();
        assert_eq!(last.transaction_number, 5);
    }

    #[tokio::test]
    async fn start_requires_initialized_store() {
        let f = fixture(false).await;
        assert!(matches!(
            f.observer.start_periodic_processing().await,
            Err(CoreError::Store(StoreError::NotInitialized(_)))
        ));
        assert!(!f.observer.is_running());
    }

    #[tokio::test]
    async fn periodic_loop_picks_up_new_transactions() {
        let f = fixture(true).await;
        let handle = f.observer.start_periodic_processing().await.unwrap();
        assert!(f.observer.is_running());
        assert!(matches!(
            f.observer.start_periodic_processing().await,
            Err(CoreError::AlreadyStarted("observer"))
        ));

        let address = f.cas.write(&BatchFile::new(&[create("later")]).to_bytes()).await.unwrap();
        f.chain.write(&address).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while f.transactions.transaction_count().await.unwrap() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn resumes_after_stored_cursor() {
        let f = fixture(true).await;
        let address = f.cas.write(&BatchFile::default().to_bytes()).await.unwrap();
        f.chain.write(&address).await.unwrap();
        f.chain.write(&address).await.unwrap();
        f.transactions
            .add_transaction(Transaction {
                transaction_number: 1,
                transaction_time: 1,
                anchor_string: address.clone(),
            })
            .await
            .unwrap();

        let observer = Arc::new(
            Observer::new(
                f.chain.clone(),
                Arc::clone(&f.observer.download_manager),
                f.processor.clone(),
                f.transactions.clone(),
                Duration::from_secs(3600),
            )
            .unwrap(),
        );
        let handle = observer.start_periodic_processing().await.unwrap();
        assert_eq!(*observer.cursor.lock().await, Some(1));
        handle.shutdown().await;
        assert_eq!(observer.process_transactions().await.unwrap(), 1);
    }
}
