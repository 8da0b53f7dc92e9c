use std::sync::Arc;

use tracing::{debug, info};

use sidetree_clients::BlockchainClient;
use sidetree_types::{ContentHash, DidDocument, DidMethod, Operation, OperationType, ProtocolParameters};

use crate::batch_writer::BatchWriter;
use crate::error::{CoreError, CoreResult, HandlerError, HandlerResult};
use crate::lifecycle::Readiness;
use crate::processor::OperationProcessor;

/// The request surface the node exposes to callers.
///
/// Handed out as soon as the core is constructed; every request is answered
/// with [`HandlerError::NotReady`] until the core finishes initializing.
pub struct RequestHandler {
    processor: Arc<OperationProcessor>,
    blockchain: Arc<dyn BlockchainClient>,
    batch_writer: Arc<BatchWriter>,
    method: DidMethod,
    protocol: Arc<ProtocolParameters>,
    readiness: Readiness,
}

impl RequestHandler {
    pub fn new(
        processor: Arc<OperationProcessor>,
        blockchain: Arc<dyn BlockchainClient>,
        batch_writer: Arc<BatchWriter>,
        did_method_name: &str,
        protocol: Arc<ProtocolParameters>,
        readiness: Readiness,
    ) -> CoreResult<Self> {
        Ok(Self {
            processor,
            blockchain,
            batch_writer,
            method: DidMethod::parse(did_method_name)?,
            protocol,
            readiness,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// A readiness receiver for callers that want to wait on startup.
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    fn ensure_ready(&self) -> HandlerResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(HandlerError::NotReady)
        }
    }

    /// Validate an encoded operation and queue it for the next batch.
    ///
    /// A create answers with the document the new DID will resolve to once
    /// anchored; updates and deletes answer with `None`.
    pub async fn handle_operation_request(&self, body: &[u8]) -> HandlerResult<Option<DidDocument>> {
        self.ensure_ready()?;
        let time = self.blockchain.time().await.map_err(CoreError::from)?;
        let max_size = self
            .protocol
            .get(time)
            .map_err(CoreError::from)?
            .max_operation_byte_size;
        let operation = Operation::parse(body, max_size)?;
        info!(
            operation = %operation.operation_type,
            did = %operation.did_unique_suffix.short_hex(),
            "operation accepted"
        );

        let document = match operation.operation_type {
            OperationType::Create => Some(self.processor.document_for_create(&operation)),
            OperationType::Update | OperationType::Delete => None,
        };
        self.batch_writer.add(operation);
        Ok(document)
    }

    /// Resolve a full DID under this node's method, or a bare unique suffix.
    pub async fn handle_resolve_request(&self, did_or_suffix: &str) -> HandlerResult<DidDocument> {
        self.ensure_ready()?;
        let suffix = match self.method.suffix_of(did_or_suffix) {
            Some(suffix) => suffix,
            None if did_or_suffix.starts_with("did:") => {
                return Err(HandlerError::BadRequest(format!(
                    "`{did_or_suffix}` is not a {} DID",
                    self.method.prefix()
                )))
            }
            None => did_or_suffix,
        };
        let suffix: ContentHash = suffix
            .parse()
            .map_err(|_| HandlerError::BadRequest(format!("`{suffix}` is not a valid DID unique suffix")))?;
        debug!(did = %suffix.short_hex(), "resolving");

        self.processor
            .resolve(&suffix)
            .await?
            .ok_or_else(|| HandlerError::NotFound(self.method.did_for(&suffix)))
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("method", &self.method.prefix())
            .field("ready", &self.is_ready())
            .finish()
    }
}
