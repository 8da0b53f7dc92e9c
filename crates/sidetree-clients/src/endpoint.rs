use std::fmt;

use hyper::Uri;

use crate::error::{ClientError, ClientResult};

/// A parsed service address. Scheme and authority are both required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoint {
    uri: Uri,
}

impl ServiceEndpoint {
    pub fn parse(address: &str) -> ClientResult<Self> {
        let invalid = |reason: &str| ClientError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };
        let uri = address
            .parse::<Uri>()
            .map_err(|e| invalid(&e.to_string()))?;
        if uri.scheme().is_none() {
            return Err(invalid("missing scheme"));
        }
        if uri.host().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        Ok(Self { uri })
    }

    pub fn scheme(&self) -> &str {
        self.uri.scheme_str().unwrap_or_default()
    }

    pub fn host(&self) -> &str {
        self.uri.host().unwrap_or_default()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}
