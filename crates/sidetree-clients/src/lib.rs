//! Client seams for the Sidetree node's external services.
//!
//! The node talks to two services: a blockchain service that anchors batch
//! addresses and lists anchoring transactions, and a content-addressable
//! store (CAS) that holds batch files. Both are reached through the
//! [`BlockchainClient`] and [`CasClient`] traits.
//!
//! Clients are built from a service address. Construction performs no
//! network round-trip; a malformed address fails immediately.
//!
//! # Backends
//!
//! - `memory://<name>`: [`LocalBlockchain`] and [`LocalCas`], in-process
//!   services for tests, demos, and single-node development.
//!
//! Other schemes are accepted syntactically but reported as
//! [`ClientError::UnsupportedScheme`]; protocol clients for real services
//! are supplied by the embedding process.

pub mod blockchain;
pub mod cas;
pub mod endpoint;
pub mod error;

use std::sync::Arc;

pub use blockchain::{BlockchainClient, LocalBlockchain, ReadResult};
pub use cas::{CasClient, FetchResult, LocalCas};
pub use endpoint::ServiceEndpoint;
pub use error::{ClientError, ClientResult};

/// Build the blockchain client for a service address.
pub fn blockchain_client(address: &str) -> ClientResult<Arc<dyn BlockchainClient>> {
    let endpoint = ServiceEndpoint::parse(address)?;
    match endpoint.scheme() {
        "memory" => Ok(Arc::new(LocalBlockchain::new(endpoint))),
        other => Err(ClientError::UnsupportedScheme(other.to_string())),
    }
}

/// Build the CAS client for a service address.
pub fn cas_client(address: &str) -> ClientResult<Arc<dyn CasClient>> {
    let endpoint = ServiceEndpoint::parse(address)?;
    match endpoint.scheme() {
        "memory" => Ok(Arc::new(LocalCas::new(endpoint))),
        other => Err(ClientError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_addresses_build_local_clients() {
        assert!(blockchain_client("memory://chain").is_ok());
        assert!(cas_client("memory://cas").is_ok());
    }

    #[test]
    fn other_schemes_are_unsupported() {
        assert!(matches!(
            blockchain_client("http://127.0.0.1:3009"),
            Err(ClientError::UnsupportedScheme(s)) if s == "http"
        ));
        assert!(matches!(
            cas_client("https://ipfs.example:5001"),
            Err(ClientError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn malformed_addresses_fail() {
        assert!(matches!(
            blockchain_client("not an address"),
            Err(ClientError::InvalidAddress { .. })
        ));
    }
}
