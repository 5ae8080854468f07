//! rterm client entry point.
//!
//! Connects to an rterm server and sends every line read from stdin as one
//! command.  Responses are printed to stdout, prefixed with `SERVER>`.
//!
//! # Usage
//!
//! ```text
//! rterm-client [OPTIONS]
//!
//! Options:
//!   --host <HOST>     Server host name or address [default: localhost]
//!   --port <PORT>     Server port [default: 65535]
//!   --config <FILE>   TOML file with a ClientConfig
//! ```
//!
//! The client exits when the session ends (`-end`, a server hang-up, or a
//! failed connect) or when stdin is exhausted and every queued command has
//! been answered.  Logs go to stderr so they do not mix with terminal output;
//! set `RUST_LOG` to change the level.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use rterm_client::application::{TerminalController, TerminalError};
use rterm_client::domain::ClientConfig;
use rterm_client::infrastructure::view::ConsoleView;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// rterm remote command terminal client.
#[derive(Debug, Parser)]
#[command(
    name = "rterm-client",
    about = "Remote command terminal client",
    version
)]
struct Cli {
    /// Server host name or IP address.
    #[arg(long)]
    host: Option<String>,

    /// Server port.  Passed through as text; the session validates it.
    #[arg(long, allow_hyphen_values = true)]
    port: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Where to connect, after applying defaults.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    host: String,
    port_text: String,
}

impl Cli {
    /// Resolves the effective config and connection target.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    fn into_parts(self) -> anyhow::Result<(ClientConfig, Target)> {
        let config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("could not load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };
        let target = Target {
            host: self.host.unwrap_or_else(|| config.default_host.clone()),
            port_text: self
                .port
                .unwrap_or_else(|| config.default_port.to_string()),
        };
        Ok((config, target))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, target) = Cli::parse().into_parts()?;

    let view = Arc::new(ConsoleView::stdout());
    let mut controller = TerminalController::new(view, config);
    controller
        .connect(&target.host, &target.port_text)
        .context("could not start the session")?;

    forward_commands(BufReader::new(tokio::io::stdin()), &controller).await?;

    controller.disconnect().await;
    Ok(())
}

/// Queues every line of `input` as one command, exactly as typed.
///
/// Only the line terminator is removed.  Returns when the input is exhausted
/// or the session stops taking commands.
async fn forward_commands<R>(input: R, controller: &TerminalController) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed");
                    return Ok(());
                };
                match controller.send(&line) {
                    Ok(()) => {}
                    Err(TerminalError::NotConnected | TerminalError::Queue(_)) => return Ok(()),
                    Err(e) => warn!("could not send command: {e}"),
                }
            }
            _ = controller.closed() => return Ok(()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use rterm_client::infrastructure::view::RecordingView;
    use rterm_server::domain::ServerConfig;
    use rterm_server::infrastructure::Listener;
    use tokio::sync::oneshot;

    #[test]
    fn test_cli_defaults_target_localhost_65535() {
        // Arrange
        let cli = Cli::parse_from(["rterm-client"]);

        // Act
        let (_, target) = cli.into_parts().unwrap();

        // Assert
        assert_eq!(
            target,
            Target {
                host: "localhost".into(),
                port_text: "65535".into()
            }
        );
    }

    #[test]
    fn test_cli_host_and_port_override() {
        let cli = Cli::parse_from(["rterm-client", "--host", "10.1.2.3", "--port", "9000"]);
        let (_, target) = cli.into_parts().unwrap();
        assert_eq!(target.host, "10.1.2.3");
        assert_eq!(target.port_text, "9000");
    }

    #[test]
    fn test_cli_port_is_kept_as_text() {
        let cli = Cli::parse_from(["rterm-client", "--port", "ninety"]);
        let (_, target) = cli.into_parts().unwrap();
        assert_eq!(target.port_text, "ninety");
    }

    #[test]
    fn test_cli_negative_port_is_kept_for_the_session_to_reject() {
        let cli = Cli::parse_from(["rterm-client", "--port", "-5"]);
        let (_, target) = cli.into_parts().unwrap();
        assert_eq!(target.port_text, "-5");
    }

    #[test]
    fn test_cli_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["rterm-client", "--config", "/no/such/client.toml"]);
        assert!(cli.into_parts().is_err());
    }

    #[tokio::test]
    async fn test_forward_commands_sends_lines_as_typed() {
        // Arrange
        let config = ServerConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            response_delay_ms: 0,
            ..ServerConfig::default()
        };
        let listener = Listener::bind(config).await.unwrap();
        let port = listener.local_addr().port().to_string();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(listener.run(async move {
            let _ = stopped.await;
        }));
        let view = Arc::new(RecordingView::new());
        let mut controller = TerminalController::new(view.clone(), ClientConfig::default());
        controller.connect("127.0.0.1", &port).unwrap();

        // Act: trailing spaces are part of the command
        let input: &[u8] = b"-time \r\n-echo-hi  \n-end\n";
        forward_commands(input, &controller).await.unwrap();
        controller.disconnect().await;

        // Assert
        let lines = view.lines();
        assert_eq!(
            &lines[1..],
            [
                "SERVER>ERROR: Unrecognized command.",
                "SERVER>ECHO:hi  ",
                "SERVER>Connection closed.",
                "CLIENT>Connection closed.",
            ]
        );
        stop.send(()).unwrap();
        server.await.unwrap();
    }
}
