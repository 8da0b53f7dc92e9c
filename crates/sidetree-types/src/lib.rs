//! Foundation types for the Sidetree node.
//!
//! This crate provides the value types shared by every other crate in the
//! workspace. It performs no I/O beyond reading configuration files.
//!
//! # Key Types
//!
//! - [`Config`]: Immutable node configuration read once at startup
//! - [`ProtocolParameters`]: Validated, versioned protocol limits
//! - [`ContentHash`]: BLAKE3 content address for operations and batch files
//! - [`Operation`]: Parsed DID operation (create, update, delete)
//! - [`Transaction`]: Anchoring transaction observed on the blockchain
//! - [`DidMethod`]: The DID namespace this node serves

pub mod config;
pub mod did;
pub mod error;
pub mod hash;
pub mod operation;
pub mod protocol;
pub mod transaction;

pub use config::Config;
pub use did::{DidDocument, DidMethod};
pub use error::{
    ConfigError, ConfigResult, OperationError, OperationResult, ProtocolError, ProtocolResult,
    TypeError,
};
pub use hash::ContentHash;
pub use operation::{AnchoredOperation, BatchFile, Operation, OperationType};
pub use protocol::{ProtocolParameters, ProtocolVersion, ProtocolVersionFile};
pub use transaction::Transaction;
