//! Domain layer for rterm-client.

pub mod config;

pub use config::{ClientConfig, ConfigError};
