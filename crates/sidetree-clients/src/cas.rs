use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use sidetree_types::ContentHash;

use crate::endpoint::ServiceEndpoint;
use crate::error::{ClientError, ClientResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchResult {
    Found(Vec<u8>),
    NotFound,
}

/// Client for the content-addressable store holding batch files.
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Store content and return its address.
    async fn write(&self, content: &[u8]) -> ClientResult<String>;

    /// Fetch content by address.
    async fn read(&self, address: &str) -> ClientResult<FetchResult>;
}

/// In-process CAS keyed by BLAKE3 content hash.
pub struct LocalCas {
    endpoint: ServiceEndpoint,
    objects: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl LocalCas {
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        Self {
            endpoint,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CasClient for LocalCas {
    async fn write(&self, content: &[u8]) -> ClientResult<String> {
        let hash = ContentHash::of(content);
        let mut map = self.objects.write().map_err(|_| ClientError::LockPoisoned)?;
        map.entry(hash).or_insert_with(|| content.to_vec());
        debug!(endpoint = %self.endpoint, address = %hash.short_hex(), bytes = content.len(), "content stored");
        Ok(hash.to_hex())
    }

    async fn read(&self, address: &str) -> ClientResult<FetchResult> {
        let hash = ContentHash::from_hex(address)
            .map_err(|_| ClientError::InvalidContentAddress(address.to_string()))?;
        let map = self.objects.read().map_err(|_| ClientError::LockPoisoned)?;
        Ok(match map.get(&hash) {
            Some(content) => FetchResult::Found(content.clone()),
            None => FetchResult::NotFound,
        })
    }
}

impl std::fmt::Debug for LocalCas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCas")
            .field("endpoint", &self.endpoint.to_string())
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cas() -> LocalCas {
        LocalCas::new(ServiceEndpoint::parse("memory://cas").unwrap())
    }

    #[tokio::test]
    async fn write_returns_content_address() {
        let cas = cas();
        let address = cas.write(b"batch").await.unwrap();
        assert_eq!(address, ContentHash::of(b"batch").to_hex());
        assert_eq!(
            cas.read(&address).await.unwrap(),
            FetchResult::Found(b"batch".to_vec())
        );
    }

    #[tokio::test]
    async fn writes_are_idempotent() {
        let cas = cas();
        let a = cas.write(b"same").await.unwrap();
        let b = cas.write(b"same").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(cas.len(), 1);
    }

    #[tokio::test]
    async fn unknown_and_malformed_addresses() {
        let cas = cas();
        let missing = ContentHash::of(b"never written").to_hex();
        assert_eq!(cas.read(&missing).await.unwrap(), FetchResult::NotFound);
        assert!(matches!(
            cas.read("QmNotAHash").await,
            Err(ClientError::InvalidContentAddress(_))
        ));
    }
}
