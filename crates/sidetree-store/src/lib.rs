//! Persistent stores for the Sidetree node.
//!
//! Two stores back the node: the operation store (anchored DID operations,
//! queried by DID unique suffix) and the transaction store (processed
//! anchoring transactions, the observer's cursor). Both are constructed
//! without I/O and become usable only after an asynchronous `initialize`.
//!
//! # Storage Backends
//!
//! Backends are selected by [`ConnectionString`]:
//!
//! - `memory://<name>`: [`InMemoryOperationStore`] / [`InMemoryTransactionStore`]
//!
//! # Design Rules
//!
//! 1. Construction never opens a connection.
//! 2. Every call before `initialize` fails with [`StoreError::NotInitialized`].
//! 3. `initialize` is idempotent.
//! 4. Writes of already-stored records are no-ops.

pub mod connection;
pub mod error;
pub mod memory;
pub mod traits;

pub use connection::{Backend, ConnectionString};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryOperationStore, InMemoryTransactionStore};
pub use traits::{OperationStore, TransactionStore};
