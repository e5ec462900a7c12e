//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8197;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub document_root: PathBuf,
    pub ipsum_path: Option<PathBuf>,
    pub broadcast_capacity: usize,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `HOST`: bind address, default `0.0.0.0`
    /// - `PORT`: default 8197
    /// - `DOCUMENT_ROOT`: static files served at `/`, default `<crate>/www`
    /// - `IPSUM_PATH`: text source for `get-text`, built-in text when unset
    /// - `WS_BROADCAST_CAPACITY`: buffered server notifications, default 256
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a value that does not parse, or a
    /// zero broadcast capacity.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_parse("HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = env_parse("PORT", DEFAULT_PORT)?;
        let broadcast_capacity = env_parse("WS_BROADCAST_CAPACITY", DEFAULT_BROADCAST_CAPACITY)?;
        if broadcast_capacity == 0 {
            return Err(ConfigError::Invalid { var: "WS_BROADCAST_CAPACITY", value: "0".into() });
        }

        let document_root = env_non_empty("DOCUMENT_ROOT").map_or_else(default_document_root, PathBuf::from);
        let ipsum_path = env_non_empty("IPSUM_PATH").map(PathBuf::from);

        Ok(Self { host, port, document_root, ipsum_path, broadcast_capacity })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Resolve the bundled demo page directory.
fn default_document_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("www")
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let Some(raw) = env_non_empty(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var: key, value: raw })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
