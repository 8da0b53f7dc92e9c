use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use sidetree_store::OperationStore;
use sidetree_types::{
    AnchoredOperation, BatchFile, ContentHash, DidDocument, DidMethod, Operation, OperationType,
    ProtocolParameters, Transaction,
};

use crate::error::CoreResult;

/// Validates anchored operations into the operation store and resolves DID
/// documents from them.
pub struct OperationProcessor {
    method: DidMethod,
    operation_store: Arc<dyn OperationStore>,
    protocol: Arc<ProtocolParameters>,
}

impl OperationProcessor {
    pub fn new(
        did_method_name: &str,
        operation_store: Arc<dyn OperationStore>,
        protocol: Arc<ProtocolParameters>,
    ) -> CoreResult<Self> {
        Ok(Self {
            method: DidMethod::parse(did_method_name)?,
            operation_store,
            protocol,
        })
    }

    pub fn method(&self) -> &DidMethod {
        &self.method
    }

    /// Store the valid operations of a batch anchored by `transaction`.
    ///
    /// Operations that fail to parse under the protocol version in force at
    /// the transaction's time are skipped. Returns the number stored.
    pub async fn process_batch(&self, transaction: &Transaction, batch: &BatchFile) -> CoreResult<usize> {
        let max_size = self.protocol.get(transaction.transaction_time)?.max_operation_byte_size;
        let mut anchored = Vec::with_capacity(batch.operations.len());
        for (index_in_batch, encoded) in batch.operations.iter().enumerate() {
            match Operation::parse(encoded.as_bytes(), max_size) {
                Ok(operation) => anchored.push(AnchoredOperation {
                    operation,
                    transaction_number: transaction.transaction_number,
                    transaction_time: transaction.transaction_time,
                    index_in_batch,
                }),
                Err(e) => warn!(
                    transaction_number = transaction.transaction_number,
                    index_in_batch,
                    error = %e,
                    "skipping invalid operation"
                ),
            }
        }
        let stored = anchored.len();
        if stored > 0 {
            self.operation_store.put(anchored).await?;
        }
        debug!(
            transaction_number = transaction.transaction_number,
            stored,
            total = batch.operations.len(),
            "batch processed"
        );
        Ok(stored)
    }

    /// Replay the operations of a DID in chain order.
    ///
    /// Returns `None` for unknown or deleted DIDs. An update or delete applies
    /// only if it names the hash of the last applied operation.
    pub async fn resolve(&self, did_unique_suffix: &ContentHash) -> CoreResult<Option<DidDocument>> {
        let operations = self.operation_store.get(did_unique_suffix).await?;
        let mut state: Option<(Map<String, Value>, ContentHash)> = None;

        for anchored in operations {
            let op = &anchored.operation;
            let last = state.as_ref().map(|(_, hash)| *hash);
            match op.operation_type {
                OperationType::Create if last.is_none() && op.operation_hash == *did_unique_suffix => {
                    state = Some((op.document.clone().unwrap_or_default(), op.operation_hash));
                }
                OperationType::Update if last.is_some() && op.previous_operation_hash == last => {
                    state = Some((op.document.clone().unwrap_or_default(), op.operation_hash));
                }
                OperationType::Delete if last.is_some() && op.previous_operation_hash == last => {
                    debug!(did = %did_unique_suffix.short_hex(), "DID deleted");
                    return Ok(None);
                }
                _ => debug!(
                    did = %did_unique_suffix.short_hex(),
                    operation = %op.operation_type,
                    transaction_number = anchored.transaction_number,
                    "operation does not apply; skipped"
                ),
            }
        }

        Ok(state.map(|(content, _)| DidDocument {
            id: self.method.did_for(did_unique_suffix),
            content,
        }))
    }

    /// The document a create operation produces, before it is anchored.
    pub fn document_for_create(&self, operation: &Operation) -> DidDocument {
        DidDocument {
            id: self.method.did_for(&operation.did_unique_suffix),
            content: operation.document.clone().unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for OperationProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationProcessor")
            .field("method", &self.method.prefix())
            .finish()
    }
}
