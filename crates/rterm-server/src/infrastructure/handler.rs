//! Per-connection handler: negotiate → serve → close.
//!
//! One [`ConnectionHandler`] owns one accepted socket for its whole life.  The
//! handler answers commands strictly one at a time: it reads a command, sends
//! exactly one response, pauses for the configured delay, and only then reads
//! the next command.
//!
//! ```text
//!  StreamNegotiation ──ok──► Serving ──-end / EOF / error──► Closed
//!         │                                                    ▲
//!         └──────────────── negotiation failed ────────────────┘
//! ```
//!
//! Nothing here is shared between connections; a misbehaving peer can only
//! end its own handler.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rterm_core::protocol::messages::{Message, Response};
use rterm_core::{MessageStream, Reply, Responder, StreamError};

use crate::domain::ServerConfig;

// ── States and outcomes ───────────────────────────────────────────────────────

/// Lifecycle state of a [`ConnectionHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    StreamNegotiation,
    Serving,
    Closed,
}

/// Why a handler stopped serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The client sent `-end`; the End token was delivered.
    Ended,
    /// The client closed the connection between commands.
    PeerDisconnected,
    /// Stream negotiation failed or timed out; nothing was served.
    NegotiationFailed,
    /// The client sent something that is not a command.
    ProtocolViolation,
    /// The transport failed mid-conversation.
    IoFailed,
}

// ── ConnectionHandler ─────────────────────────────────────────────────────────

/// Serves a single client connection.
pub struct ConnectionHandler {
    id: Uuid,
    peer: String,
    responder: Responder,
    response_delay: Duration,
    negotiation_timeout: Duration,
    state: HandlerState,
}

impl ConnectionHandler {
    /// Creates a handler for the connection from `peer`.
    ///
    /// `peer` is only used in log lines.
    pub fn new(peer: impl Into<String>, responder: Responder, config: &ServerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer: peer.into(),
            responder,
            response_delay: config.response_delay(),
            negotiation_timeout: config.negotiation_timeout(),
            state: HandlerState::StreamNegotiation,
        }
    }

    /// Connection id used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Runs the full lifecycle over `transport` and reports how it ended.
    ///
    /// Never returns an error: every failure is logged here and mapped to a
    /// [`HandlerOutcome`].  The transport is always closed on return.
    pub async fn run<S>(&mut self, transport: S) -> HandlerOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        info!(id = %self.id, peer = %self.peer, "connection accepted");

        let mut stream = match MessageStream::negotiate(transport, self.negotiation_timeout).await {
            Ok(stream) => stream,
            Err(e) => {
                // The transport was moved into `negotiate` and is dropped with it.
                warn!(id = %self.id, peer = %self.peer, "stream negotiation failed: {e}");
                self.transition(HandlerState::Closed);
                return HandlerOutcome::NegotiationFailed;
            }
        };

        self.transition(HandlerState::Serving);
        let outcome = self.serve(&mut stream).await;

        self.transition(HandlerState::Closed);
        if let Err(e) = stream.shutdown().await {
            warn!(id = %self.id, peer = %self.peer, "error closing connection: {e}");
        }
        info!(id = %self.id, peer = %self.peer, ?outcome, "connection closed");
        outcome
    }

    async fn serve<S>(&self, stream: &mut MessageStream<S>) -> HandlerOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let command = match stream.recv().await {
                Ok(Some(Message::Command(text))) => text,
                Ok(Some(other)) => {
                    error!(
                        id = %self.id,
                        kind = ?other.message_type(),
                        "expected a command; closing connection"
                    );
                    return HandlerOutcome::ProtocolViolation;
                }
                Ok(None) => {
                    info!(id = %self.id, "client disconnected");
                    return HandlerOutcome::PeerDisconnected;
                }
                Err(StreamError::Protocol(e)) => {
                    error!(id = %self.id, "undecodable message: {e}; closing connection");
                    return HandlerOutcome::ProtocolViolation;
                }
                Err(e) => {
                    info!(id = %self.id, "connection lost while awaiting a command: {e}");
                    return HandlerOutcome::IoFailed;
                }
            };
            debug!(id = %self.id, %command, "command received");

            let response = match self.responder.reply(&command) {
                Reply::Respond(response) => response,
                Reply::End => {
                    return match stream.send(&Message::Response(Response::EndSignal)).await {
                        Ok(()) => HandlerOutcome::Ended,
                        Err(e) => {
                            warn!(id = %self.id, "failed to send end signal: {e}");
                            HandlerOutcome::IoFailed
                        }
                    };
                }
            };

            if let Err(e) = stream.send(&Message::Response(response)).await {
                warn!(id = %self.id, "failed to send response: {e}");
                return HandlerOutcome::IoFailed;
            }

            if !self.response_delay.is_zero() {
                tokio::time::sleep(self.response_delay).await;
            }
        }
    }

    fn transition(&mut self, next: HandlerState) {
        debug!(id = %self.id, from = ?self.state, to = ?next, "handler state change");
        self.state = next;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
