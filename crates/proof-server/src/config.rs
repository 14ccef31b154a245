//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_KEYS_DIR: &str = "keys";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid ZENIGMA_BIND_ADDR {value:?}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the circuit proving and verifying keys
    pub keys_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup("ZENIGMA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidBindAddr {
                value: addr.clone(),
                reason: e.to_string(),
            }
        })?;
        let keys_dir = lookup("ZENIGMA_KEYS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_DIR));

        Ok(Self {
            bind_addr,
            keys_dir,
        })
    }
}
