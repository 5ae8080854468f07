//! Domain layer for rterm-server.
//!
//! Holds the plain configuration struct.  Nothing here touches sockets.

pub mod config;

pub use config::{ConfigError, ServerConfig};
