use std::sync::Arc;

use sidetree_clients::{BlockchainClient, CasClient};
use sidetree_store::{
    Backend, ConnectionString, InMemoryOperationStore, InMemoryTransactionStore, OperationStore,
    TransactionStore,
};

use crate::error::CoreResult;

/// Builds the collaborators the core wires together.
///
/// Implementations must not perform I/O: every call happens during
/// synchronous construction. Stores are brought online later by
/// `Core::initialize`.
pub trait ComponentFactory {
    fn blockchain_client(&self, address: &str) -> CoreResult<Arc<dyn BlockchainClient>>;

    fn cas_client(&self, address: &str) -> CoreResult<Arc<dyn CasClient>>;

    fn operation_store(&self, connection_string: &str) -> CoreResult<Arc<dyn OperationStore>>;

    fn transaction_store(&self, connection_string: &str) -> CoreResult<Arc<dyn TransactionStore>>;
}

/// Selects built-in backends by address scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFactory;

impl ComponentFactory for DefaultFactory {
    fn blockchain_client(&self, address: &str) -> CoreResult<Arc<dyn BlockchainClient>> {
        Ok(sidetree_clients::blockchain_client(address)?)
    }

    fn cas_client(&self, address: &str) -> CoreResult<Arc<dyn CasClient>> {
        Ok(sidetree_clients::cas_client(address)?)
    }

    fn operation_store(&self, connection_string: &str) -> CoreResult<Arc<dyn OperationStore>> {
        let connection = ConnectionString::parse(connection_string)?;
        match connection.backend {
            Backend::Memory => Ok(Arc::new(InMemoryOperationStore::new(&connection))),
        }
    }

    fn transaction_store(&self, connection_string: &str) -> CoreResult<Arc<dyn TransactionStore>> {
        let connection = ConnectionString::parse(connection_string)?;
        match connection.backend {
            Backend::Memory => Ok(Arc::new(InMemoryTransactionStore::new(&connection))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidetree_clients::ClientError;
    use sidetree_store::StoreError;

    use crate::error::CoreError;

    #[test]
    fn memory_backends() {
        let factory = DefaultFactory;
        assert!(factory.blockchain_client("memory://chain").is_ok());
        assert!(factory.cas_client("memory://cas").is_ok());
        assert!(factory.operation_store("memory://db").is_ok());
        assert!(factory.transaction_store("memory://db").is_ok());
    }

    #[test]
    fn errors_map_into_core_errors() {
        let factory = DefaultFactory;
        assert!(matches!(
            factory.blockchain_client("http://localhost:3009"),
            Err(CoreError::Client(ClientError::UnsupportedScheme(_)))
        ));
        assert!(matches!(
            factory.operation_store("mongodb://localhost:27017/sidetree"),
            Err(CoreError::Store(StoreError::UnsupportedBackend(_)))
        ));
        assert!(matches!(
            factory.transaction_store("no scheme"),
            Err(CoreError::Store(StoreError::InvalidConnectionString(_)))
        ));
    }
}
