use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sidetree_types::Config;

use crate::error::{NodeError, NodeResult};

/// Contents of the node's TOML file: the core configuration under `[core]`
/// and the HTTP host under `[server]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    pub core: Config,
    #[serde(default)]
    pub server: ServerConfig,
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> NodeResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> NodeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| NodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}
