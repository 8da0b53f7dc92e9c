use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// One version of the protocol limits.
///
/// A version is in force from `starting_blockchain_time` until the starting
/// time of the next version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub starting_blockchain_time: u64,
    pub max_operations_per_batch: usize,
    pub max_operation_byte_size: usize,
}

/// On-disk form of a protocol version set (`[[versions]]` tables).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProtocolVersionFile {
    pub versions: Vec<ProtocolVersion>,
}

impl ProtocolVersionFile {
    pub fn from_toml_str(s: &str) -> ProtocolResult<Self> {
        toml::from_str(s).map_err(|e| ProtocolError::Load(e.to_string()))
    }

    pub fn load(path: &Path) -> ProtocolResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::Load(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// The installed, immutable protocol version set.
///
/// Created exactly once per core by [`ProtocolParameters::initialize`] and
/// shared as an `Arc` with every component that reads protocol limits. A
/// component cannot be built without a reference to it, so no component can
/// read a parameter before the set is installed.
#[derive(Debug)]
pub struct ProtocolParameters {
    versions: Vec<ProtocolVersion>,
}

impl ProtocolParameters {
    /// Validate and install a version set.
    pub fn initialize(versions: Vec<ProtocolVersion>) -> ProtocolResult<Arc<Self>> {
        if versions.is_empty() {
            return Err(ProtocolError::NoVersions);
        }
        for pair in versions.windows(2) {
            if pair[1].starting_blockchain_time <= pair[0].starting_blockchain_time {
                return Err(ProtocolError::UnorderedVersions {
                    previous: pair[0].starting_blockchain_time,
                    next: pair[1].starting_blockchain_time,
                });
            }
        }
        for version in &versions {
            if version.max_operations_per_batch == 0 {
                return Err(ProtocolError::ZeroLimit {
                    starting_blockchain_time: version.starting_blockchain_time,
                    field: "max_operations_per_batch",
                });
            }
            if version.max_operation_byte_size == 0 {
                return Err(ProtocolError::ZeroLimit {
                    starting_blockchain_time: version.starting_blockchain_time,
                    field: "max_operation_byte_size",
                });
            }
        }
        Ok(Arc::new(Self { versions }))
    }

    /// The version in force at `blockchain_time`.
    pub fn get(&self, blockchain_time: u64) -> ProtocolResult<&ProtocolVersion> {
        let idx = self
            .versions
            .partition_point(|v| v.starting_blockchain_time <= blockchain_time);
        if idx == 0 {
            return Err(ProtocolError::NoVersionForTime(blockchain_time));
        }
        Ok(&self.versions[idx - 1])
    }

    /// The most recent version.
    pub fn latest(&self) -> &ProtocolVersion {
        // Non-empty by construction.
        &self.versions[self.versions.len() - 1]
    }

    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }
}
