//! rterm server entry point.
//!
//! Listens for rterm clients and answers their commands.  Every connection is
//! served by its own task; a misbehaving client only affects itself.
//!
//! # Usage
//!
//! ```text
//! rterm-server [OPTIONS] [PORT]
//!
//! Arguments:
//!   [PORT]              Port to listen on [default: 65535]
//!
//! Options:
//!   --delay-ms <MS>     Pause after each response, in milliseconds [default: 100]
//!   --config <FILE>     TOML file with a ServerConfig
//! ```
//!
//! Command-line values override the config file, which overrides the
//! built-in defaults.  Set `RUST_LOG` (e.g. `RUST_LOG=debug`) to change the
//! log level.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rterm_server::domain::config::parse_port;
use rterm_server::domain::ServerConfig;
use rterm_server::infrastructure::Listener;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// rterm remote command terminal server.
#[derive(Debug, Parser)]
#[command(
    name = "rterm-server",
    about = "Remote command terminal server",
    version
)]
struct Cli {
    /// Port to listen on.
    ///
    /// Taken as text so that a non-numeric value is reported by the server
    /// itself rather than by the argument parser.
    #[arg(allow_negative_numbers = true)]
    port: Option<String>,

    /// Pause after each response before the next command is read, in
    /// milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Builds the effective [`ServerConfig`]: defaults, then the config file,
    /// then command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the port is
    /// not a number.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("could not load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(text) = &self.port {
            config.port = parse_port(text).context("invalid port argument")?;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.response_delay_ms = delay_ms;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;
    info!(
        "rterm server starting (port={}, response_delay={:?})",
        config.port,
        config.response_delay()
    );

    let listener = Listener::bind(config)
        .await
        .context("could not start listening")?;

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                // Without a signal handler the server runs until killed.
                error!("failed to listen for Ctrl+C signal: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    listener.run(shutdown).await;

    info!("rterm server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_cli_without_arguments_uses_default_port() {
        // Arrange
        let cli = Cli::parse_from(["rterm-server"]);

        // Act
        let config = cli.into_server_config().unwrap();

        // Assert
        assert_eq!(config.port, 65535);
        assert_eq!(config.response_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_cli_positional_port_override() {
        let cli = Cli::parse_from(["rterm-server", "9000"]);
        assert_eq!(cli.into_server_config().unwrap().port, 9000);
    }

    #[test]
    fn test_cli_out_of_range_port_is_left_for_the_listener() {
        let cli = Cli::parse_from(["rterm-server", "70000"]);
        assert_eq!(cli.into_server_config().unwrap().port, 70000);
    }

    #[test]
    fn test_cli_non_numeric_port_is_an_error() {
        let cli = Cli::parse_from(["rterm-server", "abc"]);
        assert!(cli.into_server_config().is_err());
    }

    #[test]
    fn test_cli_delay_override() {
        let cli = Cli::parse_from(["rterm-server", "--delay-ms", "0"]);
        assert_eq!(cli.into_server_config().unwrap().response_delay(), Duration::ZERO);
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("rterm-server-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "port = 9100\nresponse_delay_ms = 250").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        // Act
        let from_file = Cli::parse_from(["rterm-server", "--config", &path_arg])
            .into_server_config()
            .unwrap();
        let overridden = Cli::parse_from(["rterm-server", "--config", &path_arg, "9200"])
            .into_server_config()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        // Assert
        assert_eq!(from_file.port, 9100);
        assert_eq!(from_file.response_delay(), Duration::from_millis(250));
        assert_eq!(overridden.port, 9200);
        assert_eq!(overridden.response_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_cli_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["rterm-server", "--config", "/no/such/rterm.toml"]);
        assert!(cli.into_server_config().is_err());
    }
}
