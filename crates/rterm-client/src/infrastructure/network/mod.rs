//! Network infrastructure for the client application.
//!
//! - [`connect`] turns the user's host and port text into an open socket.
//! - [`session`] drives one connection: negotiate, send queued commands one
//!   at a time, route responses to the view, close.
//!
//! Every failure a session can hit is a [`SessionError`]; its
//! [`user_message`](SessionError::user_message) is the line shown in the
//! terminal.

use std::io;
use std::time::Duration;

use rterm_core::{ProtocolError, StreamError};
use thiserror::Error;

pub mod connect;
pub mod session;

pub use session::{spawn_session, ConnectionState, SessionHandle};

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The port text is not a number.
    #[error("invalid port number '{0}'")]
    InvalidPort(String),

    /// The host name could not be resolved.
    #[error("unknown host '{host}'")]
    UnknownHost {
        host: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The port is a number but not a valid TCP port.
    #[error("port {0} is out of range")]
    PortOutOfRange(i32),

    /// The OS refused to open the connection.
    #[error("permission denied while connecting: {0}")]
    PermissionDenied(#[source] io::Error),

    /// Nothing is listening, or the connection failed for another I/O reason.
    #[error("connection refused: {0}")]
    Refused(#[source] io::Error),

    /// The TCP connection was not established in time.
    #[error("timed out connecting after {0:?}")]
    ConnectTimeout(Duration),

    /// The socket opened but the peer never completed stream negotiation.
    #[error("stream negotiation timed out after {0:?}")]
    NegotiationTimeout(Duration),

    /// The peer answered negotiation with a foreign preamble or version.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(#[source] ProtocolError),

    /// Negotiation failed on the transport.
    #[error("could not create I/O streams: {0}")]
    Streams(#[source] io::Error),

    /// A command too large to frame.  Only that command is dropped.
    #[error("command of {0} bytes is too long to send")]
    CommandTooLarge(usize),

    /// Writing a command failed.
    #[error("could not send command: {0}")]
    SendFailed(#[source] StreamError),

    /// The server sent something that is not a response.
    #[error("unknown response received: {0}")]
    UnknownResponse(String),

    /// Reading a response failed.
    #[error("could not read response: {0}")]
    ReadFailed(#[source] StreamError),
}

impl SessionError {
    /// The single line shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPort(_) => "CLIENT>ERROR: Invalid port number.".to_string(),
            Self::UnknownHost { .. } => "CLIENT>ERROR: Unknown Host.".to_string(),
            Self::PortOutOfRange(_) => "CLIENT>ERROR: Port number is out of range.".to_string(),
            Self::PermissionDenied(_) => {
                "CLIENT>ERROR: A security manager has prevented a connection.".to_string()
            }
            Self::Refused(_) => "CLIENT>ERROR: Connection refused: server is not available. \
                 Check port or restart server."
                .to_string(),
            Self::ConnectTimeout(_) => {
                "CLIENT>ERROR: Timed out connecting to the server.".to_string()
            }
            Self::NegotiationTimeout(_) => "CLIENT>ERROR: Time out. A connection to the server \
                 was made but it does not follow the same protocol."
                .to_string(),
            Self::ProtocolMismatch(_) => {
                "CLIENT>ERROR: The server does not follow the same protocol.".to_string()
            }
            Self::Streams(e) => format!("CLIENT>ERROR: Could not create I/O streams - {e}"),
            Self::CommandTooLarge(_) => "CLIENT>ERROR: Command is too long to send.".to_string(),
            Self::SendFailed(_) => {
                "ERROR: Could not send command, closing connection...".to_string()
            }
            Self::UnknownResponse(_) => "ERROR: Unknown response received.".to_string(),
            Self::ReadFailed(e) => format!("ERROR: Could not read response - {}", detail(e)),
        }
    }
}

impl From<StreamError> for SessionError {
    /// Classifies a failure of stream negotiation.
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Timeout(limit) => Self::NegotiationTimeout(limit),
            StreamError::Protocol(p) => Self::ProtocolMismatch(p),
            StreamError::Io(io) => Self::Streams(io),
        }
    }
}

/// The innermost cause, without the layer prefixes of the `Display` chain.
fn detail(e: &StreamError) -> String {
    match e {
        StreamError::Io(io) => io.to_string(),
        StreamError::Protocol(p) => p.to_string(),
        StreamError::Timeout(limit) => format!("timed out after {limit:?}"),
    }
}
