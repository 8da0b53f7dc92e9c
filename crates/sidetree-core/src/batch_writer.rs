use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use sidetree_clients::{BlockchainClient, CasClient};
use sidetree_types::{BatchFile, ConfigError, Operation, ProtocolParameters};

use crate::background::LoopHandle;
use crate::error::{CoreError, CoreResult};

/// Periodically bundles queued operations into a batch file, stores it in
/// the CAS, and anchors its address on the blockchain.
pub struct BatchWriter {
    blockchain: Arc<dyn BlockchainClient>,
    cas: Arc<dyn CasClient>,
    interval: Duration,
    protocol: Arc<ProtocolParameters>,
    pending: Mutex<VecDeque<Operation>>,
    started: AtomicBool,
}

impl BatchWriter {
    pub fn new(
        blockchain: Arc<dyn BlockchainClient>,
        cas: Arc<dyn CasClient>,
        interval: Duration,
        protocol: Arc<ProtocolParameters>,
    ) -> CoreResult<Self> {
        if interval.is_zero() {
            return Err(ConfigError::invalid("batching_interval_in_seconds", "must be positive").into());
        }
        Ok(Self {
            blockchain,
            cas,
            interval,
            protocol,
            pending: Mutex::new(VecDeque::new()),
            started: AtomicBool::new(false),
        })
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Operation>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an operation for the next batch.
    pub fn add(&self, operation: Operation) {
        debug!(operation_hash = %operation.operation_hash.short_hex(), "operation queued");
        self.queue().push_back(operation);
    }

    pub fn pending_count(&self) -> usize {
        self.queue().len()
    }

    /// Write one batch. Returns the number of operations anchored.
    ///
    /// On failure the drained operations go back to the front of the queue
    /// in their original order.
    pub async fn write_batch(&self) -> CoreResult<usize> {
        let time = self.blockchain.time().await?;
        let limit = self.protocol.get(time)?.max_operations_per_batch;

        let batch: Vec<Operation> = {
            let mut queue = self.queue();
            let take = limit.min(queue.len());
            queue.drain(..take).collect()
        };
        if batch.is_empty() {
            return Ok(0);
        }

        match self.anchor(&batch).await {
            Ok(address) => {
                info!(operations = batch.len(), %address, blockchain_time = time, "batch anchored");
                Ok(batch.len())
            }
            Err(e) => {
                let mut queue = self.queue();
                for op in batch.into_iter().rev() {
                    queue.push_front(op);
                }
                Err(e)
            }
        }
    }

    async fn anchor(&self, batch: &[Operation]) -> CoreResult<String> {
        let file = BatchFile::new(batch);
        let address = self.cas.write(&file.to_bytes()).await?;
        self.blockchain.write(&address).await?;
        Ok(address)
    }

    /// Arm the periodic batching loop.
    pub fn start_periodic_batch_writing(self: &Arc<Self>) -> CoreResult<LoopHandle> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AlreadyStarted("batch writer"));
        }
        info!(interval_secs = self.interval.as_secs_f64(), "periodic batch writing started");
        let writer = Arc::clone(self);
        Ok(LoopHandle::spawn_periodic("batch-writer", self.interval, move || {
            let writer = Arc::clone(&writer);
            async move {
                if let Err(e) = writer.write_batch().await {
                    warn!(error = %e, pending = writer.pending_count(), "batch write failed");
                }
            }
        }))
    }
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("interval", &self.interval)
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use sidetree_clients::{
        ClientError, ClientResult, FetchResult, LocalBlockchain, LocalCas, ServiceEndpoint,
    };
    use sidetree_types::ProtocolVersion;

    fn protocol(max_operations_per_batch: usize) -> Arc<ProtocolParameters> {
        ProtocolParameters::initialize(vec![ProtocolVersion {
            starting_blockchain_time: 0,
            max_operations_per_batch,
            max_operation_byte_size: 2000,
        }])
        .unwrap()
    }

    fn op(n: u64) -> Operation {
        let body = json!({ "type": "create", "document": { "n": n } });
        Operation::parse(body.to_string().as_bytes(), 2000).unwrap()
    }

    fn clients() -> (Arc<LocalBlockchain>, Arc<LocalCas>) {
        (
            Arc::new(LocalBlockchain::new(ServiceEndpoint::parse("memory://chain").unwrap())),
            Arc::new(LocalCas::new(ServiceEndpoint::parse("memory://cas").unwrap())),
        )
    }

    struct BrokenCas;

    #[async_trait]
    impl CasClient for BrokenCas {
        async fn write(&self, _content: &[u8]) -> ClientResult<String> {
            Err(ClientError::Unavailable("cas offline".into()))
        }

        async fn read(&self, _address: &str) -> ClientResult<FetchResult> {
            Err(ClientError::Unavailable("cas offline".into()))
        }
    }

    #[test]
    fn zero_interval_is_config_error() {
        let (chain, cas) = clients();
        let err = BatchWriter::new(chain, cas, Duration::ZERO, protocol(10)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue {
                field: "batching_interval_in_seconds",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn empty_queue_writes_nothing() {
        let (chain, cas) = clients();
        let writer = BatchWriter::new(chain.clone(), cas, Duration::from_secs(1), protocol(10)).unwrap();
        assert_eq!(writer.write_batch().await.unwrap(), 0);
        assert_eq!(chain.time().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn batches_respect_protocol_limit() {
        let (chain, cas) = clients();
        let writer =
            BatchWriter::new(chain.clone(), cas.clone(), Duration::from_secs(1), protocol(2)).unwrap();
        for n in 0..3 {
            writer.add(op(n));
        }

        assert_eq!(writer.write_batch().await.unwrap(), 2);
        assert_eq!(writer.write_batch().await.unwrap(), 1);
        assert_eq!(writer.pending_count(), 0);

        let anchors = chain.read(None, 10).await.unwrap().transactions;
        assert_eq!(anchors.len(), 2);
        let FetchResult::Found(bytes) = cas.read(&anchors[0].anchor_string).await.unwrap() else {
            panic!("batch file missing from CAS");
        };
        let file = BatchFile::from_bytes(&bytes).unwrap();
        assert_eq!(file.operations.len(), 2);
        assert_eq!(file.operations[0], op(0).encoded());
    }

    #[tokio::test]
    async fn failed_write_requeues_in_order() {
        let (chain, _) = clients();
        let writer =
            BatchWriter::new(chain.clone(), Arc::new(BrokenCas), Duration::from_secs(1), protocol(2))
                .unwrap();
        for n in 0..3 {
            writer.add(op(n));
        }

        assert!(matches!(writer.write_batch().await, Err(CoreError::Client(_))));
        assert_eq!(writer.pending_count(), 3);
        let order: Vec<_> = writer.queue().iter().map(|o| o.operation_hash).collect();
        assert_eq!(
            order,
            vec![op(0).operation_hash, op(1).operation_hash, op(2).operation_hash]
        );
        assert_eq!(chain.time().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn periodic_loop_anchors_queued_operations() {
        let (chain, cas) = clients();
        let writer = Arc::new(
            BatchWriter::new(chain.clone(), cas, Duration::from_millis(10), protocol(10)).unwrap(),
        );
        let handle = writer.start_periodic_batch_writing().unwrap();
        writer.add(op(7));

        tokio::time::timeout(Duration::from_secs(2), async {
            while chain.time().await.unwrap() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(writer.pending_count(), 0);

        assert!(matches!(
            writer.start_periodic_batch_writing(),
            Err(CoreError::AlreadyStarted("batch writer"))
        ));
        handle.shutdown().await;
    }
}
