//! Client session: one task per connection attempt.
//!
//! ```text
//!  Connecting ──► StreamNegotiation ──► Active ──► Closing ──► Closed
//!      │                  │
//!      └──► Idle ◄────────┴──► Closing
//! ```
//!
//! A connect-phase failure (bad port, unknown host, refused) returns the
//! session to `Idle` without ever owning a socket.  A failed negotiation
//! drops the socket and also ends in `Idle`.  Once `Active`, every way out
//! goes through `Closing` to `Closed`.  Sessions are single use; reconnecting
//! starts a new session with a fresh command queue.
//!
//! While `Active` the session sends one queued command, waits for exactly one
//! response, routes it to the view, and only then takes the next command.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use rterm_core::{Message, MessageStream, ProtocolError, Response, StreamError};

use crate::application::command_queue::{command_queue, CommandQueue, CommandSender};
use crate::application::terminal::{ConnectionStatus, TerminalView};
use crate::domain::ClientConfig;

use super::connect::open_socket;
use super::SessionError;

/// Line shown when the server ends the session with the End token.
pub const SERVER_CLOSED_LINE: &str = "SERVER>Connection closed.";
/// Line shown after the client closed its side successfully.
pub const CLIENT_CLOSED_LINE: &str = "CLIENT>Connection closed.";
/// Line shown when closing the connection failed.
pub const CLOSE_FAILED_LINE: &str = "CLIENT>ERROR: An error occurred while closing the connection.";

/// Lifecycle state of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    StreamNegotiation,
    Active,
    Closing,
    Closed,
}

impl ConnectionState {
    /// `true` while the session may still send commands.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::StreamNegotiation | Self::Active
        )
    }

    /// `true` once the session task has nothing left to do.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Idle | Self::Closed)
    }
}

// ── SessionHandle ─────────────────────────────────────────────────────────────

/// Owner's view of a running session.
pub struct SessionHandle {
    id: Uuid,
    commands: CommandSender,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Producer side of this session's command queue.
    pub fn commands(&self) -> &CommandSender {
        &self.commands
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Waits until the session reaches its final state (`Idle` or `Closed`)
    /// and returns it.
    pub async fn closed(&self) -> ConnectionState {
        let mut state = self.state.clone();
        let result = state.wait_for(|s| s.is_final()).await.map(|s| *s);
        // The sender only drops after the final state was published.
        result.unwrap_or_else(|_| *state.borrow())
    }

    /// Stops accepting commands and waits for the session task to finish.
    ///
    /// Commands already queued are still sent, in order, before the session
    /// closes.  Clones of [`SessionHandle::commands`] keep the queue open, so
    /// drop them first.
    pub async fn finish(self) {
        let Self { id, commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!(%id, "session task failed: {e}");
        }
    }
}

/// Starts a session that connects to `host` on `port_text` and then serves
/// the returned handle's command queue.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_session(
    host: &str,
    port_text: &str,
    config: &ClientConfig,
    view: Arc<dyn TerminalView>,
) -> SessionHandle {
    let id = Uuid::new_v4();
    let (commands, queue) = command_queue();
    let (state_tx, state) = watch::channel(ConnectionState::Connecting);

    let session = Session {
        id,
        view,
        state: state_tx,
        connect_timeout: config.connect_timeout(),
        negotiation_timeout: config.negotiation_timeout(),
    };
    let span = info_span!("session", %id, %host);
    let host = host.to_owned();
    let port_text = port_text.to_owned();
    let task = tokio::spawn(
        async move { session.run(&host, &port_text, queue).await }.instrument(span),
    );

    SessionHandle {
        id,
        commands,
        state,
        task,
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

struct Session {
    id: Uuid,
    view: Arc<dyn TerminalView>,
    state: watch::Sender<ConnectionState>,
    connect_timeout: Duration,
    negotiation_timeout: Duration,
}

impl Session {
    async fn run(self, host: &str, port_text: &str, mut queue: CommandQueue) {
        // Reported before anything else so a second connect cannot start.
        self.view.set_connection_state(ConnectionStatus::Connected);

        let socket = match open_socket(host, port_text, self.connect_timeout).await {
            Ok(socket) => socket,
            Err(e) => {
                info!("connect failed: {e}");
                self.view.append_line(&e.user_message());
                queue.close();
                self.view.set_connection_state(ConnectionStatus::Disconnected);
                self.transition(ConnectionState::Idle);
                return;
            }
        };

        self.transition(ConnectionState::StreamNegotiation);
        let peer = match socket.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => format!("{host}:{port_text}"),
        };

        let final_state = match MessageStream::negotiate(socket, self.negotiation_timeout).await {
            Ok(mut stream) => {
                self.transition(ConnectionState::Active);
                info!(%peer, "connected");
                self.view.append_line(&format!("Connected to {peer}"));
                self.serve(&mut stream, &mut queue).await;
                self.transition(ConnectionState::Closing);
                queue.close();
                self.close(&mut stream).await;
                ConnectionState::Closed
            }
            Err(e) => {
                let e = SessionError::from(e);
                warn!(%peer, "stream negotiation failed: {e}");
                self.view.append_line(&e.user_message());
                self.transition(ConnectionState::Closing);
                queue.close();
                // The socket was consumed and dropped by the failed negotiation.
                self.view.append_line(CLIENT_CLOSED_LINE);
                ConnectionState::Idle
            }
        };

        self.view.set_connection_state(ConnectionStatus::Disconnected);
        self.transition(final_state);
    }

    /// The Active loop.  Returns when the session must close.
    async fn serve<S>(&self, stream: &mut MessageStream<S>, queue: &mut CommandQueue)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let Some(command) = queue.dequeue().await else {
                debug!("command queue closed by its owner");
                return;
            };
            debug!(%command, "sending command");

            match stream.send(&Message::Command(command)).await {
                Ok(()) => {}
                // Rejected by the encoder; nothing reached the socket.
                Err(StreamError::Protocol(ProtocolError::PayloadTooLarge(len))) => {
                    self.report(SessionError::CommandTooLarge(len));
                    continue;
                }
                Err(e) => {
                    self.report(SessionError::SendFailed(e));
                    return;
                }
            }

            match stream.recv().await {
                Ok(Some(Message::Response(Response::Data(text)))) => {
                    self.view.append_line(&format!("SERVER>{text}"));
                }
                Ok(Some(Message::Response(Response::ClearSignal))) => self.view.clear(),
                Ok(Some(Message::Response(Response::EndSignal))) => {
                    info!("server ended the session");
                    self.view.append_line(SERVER_CLOSED_LINE);
                    return;
                }
                Ok(Some(other)) => {
                    self.report(SessionError::UnknownResponse(format!(
                        "{:?} message",
                        other.message_type()
                    )));
                    return;
                }
                Err(StreamError::Protocol(e)) => {
                    self.report(SessionError::UnknownResponse(e.to_string()));
                    return;
                }
                Ok(None) => {
                    info!("server closed the connection");
                    return;
                }
                Err(e) => {
                    self.report(SessionError::ReadFailed(e));
                    return;
                }
            }
        }
    }

    async fn close<S>(&self, stream: &mut MessageStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match stream.shutdown().await {
            Ok(()) => self.view.append_line(CLIENT_CLOSED_LINE),
            Err(e) => {
                warn!("error closing connection: {e}");
                self.view.append_line(CLOSE_FAILED_LINE);
            }
        }
    }

    fn report(&self, e: SessionError) {
        warn!("{e}");
        self.view.append_line(&e.user_message());
    }

    fn transition(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        debug!(id = %self.id, from = ?prev, to = ?next, "session state change");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
