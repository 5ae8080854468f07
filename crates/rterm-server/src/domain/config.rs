//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built from defaults, optionally overlaid with a TOML file, and then
//! with command-line arguments (see `main.rs`).
//!
//! ```toml
//! bind_address = "0.0.0.0"
//! port = 65535
//! response_delay_ms = 100
//! negotiation_timeout_ms = 5000
//! ```
//!
//! Every field is optional in the file; missing fields take their default.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Port used when none is given on the command line or in the config file.
pub const DEFAULT_PORT: i32 = 65535;

/// Error type for building a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The port argument is not a number.
    #[error("the provided port '{0}' is not a number")]
    InvalidPort(String),

    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime configuration for the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.  `0.0.0.0` accepts connections on every interface.
    pub bind_address: IpAddr,

    /// Listening port.
    ///
    /// Kept as a signed integer so that out-of-range values (negative or above
    /// 65535) survive parsing and are rejected by the listener with a
    /// dedicated error.
    pub port: i32,

    /// Pause after each response before the next command is read.
    ///
    /// Throttles throughput so client-side queuing is observable; set to 0 to
    /// disable.
    pub response_delay_ms: u64,

    /// Upper bound on stream negotiation with a freshly accepted peer.
    pub negotiation_timeout_ms: u64,
}

impl Default for ServerConfig {
    /// | Field                  | Default   |
    /// |------------------------|-----------|
    /// | bind_address           | `0.0.0.0` |
    /// | port                   | `65535`   |
    /// | response_delay_ms      | `100`     |
    /// | negotiation_timeout_ms | `5000`    |
    fn default() -> Self {
        Self {
            bind_address: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            response_delay_ms: 100,
            negotiation_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Parses a TOML document into a config, defaulting missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or wrongly typed values.
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

    /// The per-command pause as a [`Duration`].
    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    /// The stream negotiation bound as a [`Duration`].
    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }
}

/// Parses the port argument given on the command line.
///
/// Any 32-bit integer is accepted here; range checking happens when the
/// listener binds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPort`] if `text` is not an integer.
pub fn parse_port(text: &str) -> Result<i32, ConfigError> {
    text.parse::<i32>()
        .map_err(|_| ConfigError::InvalidPort(text.to_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
