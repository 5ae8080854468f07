//! Client configuration.
//!
//! ```toml
//! default_host = "localhost"
//! default_port = 65535
//! connect_timeout_ms = 5000
//! negotiation_timeout_ms = 5000
//! ```
//!
//! Missing fields take their default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error type for loading a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host used when `--host` is not given.
    pub default_host: String,
    /// Port used when `--port` is not given.
    pub default_port: i32,
    /// Upper bound on opening the TCP connection.
    pub connect_timeout_ms: u64,
    /// Upper bound on stream negotiation once the socket is open.
    ///
    /// A peer that accepts the connection but speaks another protocol is
    /// detected by this timeout.
    pub negotiation_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_host: "localhost".to_string(),
            default_port: 65535,
            connect_timeout_ms: 5000,
            negotiation_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Parses a TOML document, defaulting missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the TOML config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_localhost_65535() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.default_host, "localhost");
        assert_eq!(cfg.default_port, 65535);
    }

    #[test]
    fn test_default_timeouts_are_five_seconds() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.negotiation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_toml_partial_document() {
        // Arrange
        let text = "default_host = \"10.0.0.7\"\nnegotiation_timeout_ms = 250\n";

        // Act
        let cfg = ClientConfig::from_toml_str(text).unwrap();

        // Assert
        assert_eq!(cfg.default_host, "10.0.0.7");
        assert_eq!(cfg.default_port, 65535);
        assert_eq!(cfg.negotiation_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_toml_garbage_is_parse_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("default_port = [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
