use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Storage backend named by a connection string's scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Memory,
}

/// Parsed persistence connection string, `<scheme>://<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    pub backend: Backend,
    pub name: String,
}

impl ConnectionString {
    pub fn parse(s: &str) -> StoreResult<Self> {
        let (scheme, name) = s
            .split_once("://")
            .ok_or_else(|| StoreError::InvalidConnectionString(s.to_string()))?;
        if scheme.is_empty() || name.is_empty() || name.contains(char::is_whitespace) {
            return Err(StoreError::InvalidConnectionString(s.to_string()));
        }
        let backend = match scheme {
            "memory" => Backend::Memory,
            other => return Err(StoreError::UnsupportedBackend(other.to_string())),
        };
        Ok(Self {
            backend,
            name: name.to_string(),
        })
    }
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.backend {
            Backend::Memory => write!(f, "memory://{}", self.name),
        }
    }
}
