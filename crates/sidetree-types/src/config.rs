use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Node configuration, read once when the core is constructed.
///
/// Values are not checked here beyond their types; each component validates
/// the fields it consumes when it is constructed, so a bad value fails
/// construction at the step that needs it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address of the blockchain service used for anchoring.
    pub blockchain_service_uri: String,
    /// Address of the content-addressable store holding batch files.
    pub content_addressable_store_service_uri: String,
    /// Upper bound on concurrent batch-file downloads.
    pub max_concurrent_downloads: usize,
    /// Period of the batch writer loop.
    pub batching_interval_in_seconds: u64,
    /// Period of the observer loop.
    pub observing_interval_in_seconds: u64,
    /// Connection string shared by the operation and transaction stores.
    pub database_connection_string: String,
    /// DID method prefix, e.g. `did:sidetree:`.
    pub did_method_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blockchain_service_uri: "memory://blockchain".into(),
            content_addressable_store_service_uri: "memory://cas".into(),
            max_concurrent_downloads: 20,
            batching_interval_in_seconds: 600,
            observing_interval_in_seconds: 60,
            database_connection_string: "memory://sidetree".into(),
            did_method_name: "did:sidetree:".into(),
        }
    }
}

impl Config {
    pub fn batching_interval(&self) -> Duration {
        Duration::from_secs(self.batching_interval_in_seconds)
    }

    pub fn observing_interval(&self) -> Duration {
        Duration::from_secs(self.observing_interval_in_seconds)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        blockchain_service_uri = "memory://chain"
        content_addressable_store_service_uri = "memory://ipfs"
        max_concurrent_downloads = 4
        batching_interval_in_seconds = 2
        observing_interval_in_seconds = 1
        database_connection_string = "memory://db"
        did_method_name = "did:test:"
    "#;

    #[test]
    fn default_config() {
        let c = Config::default();
        assert_eq!(c.max_concurrent_downloads, 20);
        assert_eq!(c.batching_interval(), Duration::from_secs(600));
        assert_eq!(c.observing_interval(), Duration::from_secs(60));
        assert_eq!(c.did_method_name, "did:sidetree:");
    }

    #[test]
    fn parses_toml() {
        let c = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(c.blockchain_service_uri, "memory://chain");
        assert_eq!(c.max_concurrent_downloads, 4);
        assert_eq!(c.batching_interval(), Duration::from_secs(2));
    }

    #[test]
    fn missing_field_is_parse_error() {
        let err = Config::from_toml_str("max_concurrent_downloads = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_bound_is_parse_error() {
        let text = SAMPLE.replace("max_concurrent_downloads = 4", "max_concurrent_downloads = -1");
        assert!(matches!(
            Config::from_toml_str(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let c = Config::load(&path).unwrap();
        assert_eq!(c.did_method_name, "did:test:");

        let missing = dir.path().join("absent.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));
    }
}
