use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::hash::ContentHash;

/// The DID namespace served by this node, e.g. `did:sidetree:`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DidMethod {
    prefix: String,
}

impl DidMethod {
    /// Parse a method prefix of the form `did:<name>:`.
    pub fn parse(name: &str) -> ConfigResult<Self> {
        let inner = name
            .strip_prefix("did:")
            .and_then(|rest| rest.strip_suffix(':'))
            .ok_or_else(|| {
                ConfigError::invalid("did_method_name", format!("`{name}` is not of the form did:<method>:"))
            })?;
        if inner.is_empty()
            || !inner
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':')
        {
            return Err(ConfigError::invalid(
                "did_method_name",
                format!("`{name}` has an empty or non-lowercase method name"),
            ));
        }
        Ok(Self {
            prefix: name.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full DID for a unique suffix.
    pub fn did_for(&self, suffix: &ContentHash) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Extract the unique suffix from a DID under this method.
    pub fn suffix_of<'a>(&self, did: &'a str) -> Option<&'a str> {
        did.strip_prefix(self.prefix.as_str())
    }
}

/// A resolved DID document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DidDocument {
    pub id: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}
