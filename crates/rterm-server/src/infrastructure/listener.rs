//! TCP listener: bind, accept loop, and per-connection task management.
//!
//! This module is responsible for:
//!
//! 1. Validating the configured port and binding the listening socket.
//! 2. Accepting incoming TCP connections.
//! 3. Handing each connection to its own [`ConnectionHandler`] running in a
//!    dedicated Tokio task.  The accept loop never waits on handler work.
//! 4. On shutdown, letting every already-dispatched handler run to completion.
//!
//! Handlers are tracked in a [`JoinSet`] so that finished tasks are reaped
//! while the loop runs and the remaining ones can be awaited at shutdown.
//! A failed `accept` is logged and the loop carries on; only binding is
//! fatal.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};

use rterm_core::Responder;

use crate::domain::ServerConfig;
use crate::infrastructure::handler::{ConnectionHandler, HandlerOutcome};

/// Pause after an `accept` failure that is not tied to a single peer, such
/// as running out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Errors that prevent the listener from starting.  All of them are fatal to
/// the server.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("port {0} is out of range (0-65535)")]
    PortOutOfRange(i32),

    #[error("permission denied binding {addr}: {source}")]
    PermissionDenied {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// A bound listening socket ready to serve clients.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    responder: Responder,
}

impl Listener {
    /// Validates `config.port` and binds the listening socket.
    ///
    /// Port `0` binds an ephemeral port; use [`Listener::local_addr`] to learn
    /// which one.
    ///
    /// # Errors
    ///
    /// - [`ListenError::PortOutOfRange`] if the port is outside `0..=65535`.
    /// - [`ListenError::PermissionDenied`] if the OS refuses the bind.
    /// - [`ListenError::Bind`] for any other bind failure (e.g. port in use).
    pub async fn bind(config: ServerConfig) -> Result<Self, ListenError> {
        let port =
            u16::try_from(config.port).map_err(|_| ListenError::PortOutOfRange(config.port))?;
        let addr = SocketAddr::new(config.bind_address, port);

        let inner = TcpListener::bind(addr).await.map_err(|source| {
            if source.kind() == io::ErrorKind::PermissionDenied {
                ListenError::PermissionDenied { addr, source }
            } else {
                ListenError::Bind { addr, source }
            }
        })?;
        let local_addr = inner
            .local_addr()
            .map_err(|source| ListenError::Bind { addr, source })?;

        info!("listening on {local_addr}");
        Ok(Self {
            inner,
            local_addr,
            config,
            responder: Responder::default(),
        })
    }

    /// Replaces the responder handed to every new connection.
    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = responder;
        self
    }

    /// The address the socket is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Every connection gets its own task.  When the loop stops, the
    /// listening socket is closed and all running handlers are awaited; none
    /// is cancelled.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self {
            inner,
            config,
            responder,
            ..
        } = self;
        let mut handlers: JoinSet<HandlerOutcome> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested; no longer accepting connections");
                    break;
                }
                (socket, peer) = accept_retrying(|| inner.accept()) => {
                    let mut handler =
                        ConnectionHandler::new(peer.to_string(), responder.clone(), &config);
                    let span = info_span!("connection", id = %handler.id(), %peer);
                    handlers.spawn(async move { handler.run(socket).await }.instrument(span));
                }
                Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                    log_finished(joined);
                }
            }
        }

        drop(inner);
        info!(active = handlers.len(), "shutting down connections");
        while let Some(joined) = handlers.join_next().await {
            log_finished(joined);
        }
        info!("all connections closed");
    }
}

/// Calls `accept` until it succeeds, logging each failure and pausing
/// where [`accept_retry_delay`] says to.
async fn accept_retrying<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                let pause = accept_retry_delay(&e);
                warn!(?pause, "transient accept error: {e}");
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }
}

/// How long to wait before accepting again after `e`.
///
/// Errors that belong to one peer, which reset or aborted before it was
/// accepted, are retried at once.
fn accept_retry_delay(e: &io::Error) -> Duration {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => Duration::ZERO,
        _ => ACCEPT_BACKOFF,
    }
}

fn log_finished(joined: Result<HandlerOutcome, JoinError>) {
    match joined {
        Ok(outcome) => debug!(?outcome, "connection task finished"),
        Err(e) => error!("connection task failed: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
