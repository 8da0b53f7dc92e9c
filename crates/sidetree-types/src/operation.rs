use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OperationError, OperationResult};
use crate::hash::ContentHash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationBody {
    #[serde(rename = "type")]
    operation_type: OperationType,
    did_unique_suffix: Option<ContentHash>,
    previous_operation_hash: Option<ContentHash>,
    document: Option<Map<String, Value>>,
}

/// A parsed DID operation.
///
/// The operation hash covers the exact encoded text, so an operation keeps
/// its original encoding for re-batching and hashing.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub did_unique_suffix: ContentHash,
    pub previous_operation_hash: Option<ContentHash>,
    pub document: Option<Map<String, Value>>,
    pub operation_hash: ContentHash,
    encoded: String,
}

impl Operation {
    /// Parse an operation, enforcing the protocol's size limit.
    pub fn parse(bytes: &[u8], max_operation_byte_size: usize) -> OperationResult<Self> {
        if bytes.len() > max_operation_byte_size {
            return Err(OperationError::TooLarge {
                size: bytes.len(),
                max: max_operation_byte_size,
            });
        }
        let encoded = std::str::from_utf8(bytes)
            .map_err(|e| OperationError::Malformed(e.to_string()))?
            .to_string();
        let body: OperationBody =
            serde_json::from_str(&encoded).map_err(|e| OperationError::Malformed(e.to_string()))?;
        let operation_hash = ContentHash::of(bytes);
        let kind = body.operation_type.as_str();

        let (did_unique_suffix, previous_operation_hash) = match body.operation_type {
            OperationType::Create => {
                if body.document.is_none() {
                    return Err(OperationError::MissingField {
                        operation: kind,
                        field: "document",
                    });
                }
                (operation_hash, None)
            }
            OperationType::Update | OperationType::Delete => {
                let suffix = body.did_unique_suffix.ok_or(OperationError::MissingField {
                    operation: kind,
                    field: "didUniqueSuffix",
                })?;
                let previous = body
                    .previous_operation_hash
                    .ok_or(OperationError::MissingField {
                        operation: kind,
                        field: "previousOperationHash",
                    })?;
                if body.operation_type == OperationType::Update && body.document.is_none() {
                    return Err(OperationError::MissingField {
                        operation: kind,
                        field: "document",
                    });
                }
                (suffix, Some(previous))
            }
        };

        // The resolved document's `id` is the DID itself.
        if body.document.as_ref().is_some_and(|doc| doc.contains_key("id")) {
            return Err(OperationError::ReservedField {
                operation: kind,
                field: "id",
            });
        }

        Ok(Self {
            operation_type: body.operation_type,
            did_unique_suffix,
            previous_operation_hash,
            document: body.document,
            operation_hash,
            encoded,
        })
    }

    /// The exact text this operation was parsed from.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// An operation together with its position on the blockchain.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchoredOperation {
    pub operation: Operation,
    pub transaction_number: u64,
    pub transaction_time: u64,
    pub index_in_batch: usize,
}

impl AnchoredOperation {
    /// Ordering key: chain position, then position within the batch.
    pub fn position(&self) -> (u64, usize) {
        (self.transaction_number, self.index_in_batch)
    }
}

/// The content-addressed file a single anchoring transaction commits to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFile {
    /// Encoded operations, in batch order.
    pub operations: Vec<String>,
}

impl BatchFile {
    pub fn new(operations: &[Operation]) -> Self {
        Self {
            operations: operations.iter().map(|op| op.encoded.clone()).collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing a struct of strings cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> OperationResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| OperationError::MalformedBatch(e.to_string()))
    }
}
