//! Framed message stream shared by the server handler and the client session.
//!
//! # Binary streaming protocol
//!
//! TCP is a *stream* protocol: a single `read()` call may return less than one
//! complete message, or more than one.  [`MessageStream`] buffers incoming
//! bytes and uses [`decode_message`] to extract complete messages from the
//! buffer one at a time.
//!
//! The stream is generic over any `AsyncRead + AsyncWrite` transport, so the
//! same code runs over a `TcpStream` in production and over an in-memory
//! `tokio::io::duplex` pipe in tests.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::protocol::codec::{
    check_preamble, decode_message, encode_message, encode_preamble, ProtocolError,
};
use crate::protocol::messages::{Message, PREAMBLE_SIZE};

/// Size of the scratch buffer used for each `read()` call.
const READ_CHUNK: usize = 4096;

/// Errors surfaced by [`MessageStream`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying transport failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),
    /// The peer sent bytes that are not a valid rterm frame or preamble.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Stream negotiation did not finish in time.
    #[error("stream negotiation timed out after {0:?}")]
    Timeout(Duration),
}

/// A bidirectional stream of rterm [`Message`]s over a byte transport.
pub struct MessageStream<S> {
    inner: S,
    /// Accumulates bytes across multiple `read()` calls.
    recv_buf: Vec<u8>,
}

impl<S> MessageStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Performs stream negotiation over `inner` and returns the ready stream.
    ///
    /// Both peers write their preamble first and then read the other side's,
    /// so the exchange cannot deadlock regardless of who connected.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Timeout`] if the peer does not answer within `limit`
    ///   (typically a peer that accepted the TCP connection but speaks another
    ///   protocol).
    /// - [`StreamError::Protocol`] if the peer's preamble is foreign.
    /// - [`StreamError::Io`] if the transport fails or closes.
    pub async fn negotiate(inner: S, limit: Duration) -> Result<Self, StreamError> {
        let mut stream = Self {
            inner,
            recv_buf: Vec::with_capacity(READ_CHUNK),
        };
        match tokio::time::timeout(limit, stream.exchange_preamble()).await {
            Ok(result) => result.map(|()| stream),
            Err(_) => Err(StreamError::Timeout(limit)),
        }
    }

    async fn exchange_preamble(&mut self) -> Result<(), StreamError> {
        self.inner.write_all(&encode_preamble()).await?;
        self.inner.flush().await?;

        let mut peer = [0u8; PREAMBLE_SIZE];
        self.inner.read_exact(&mut peer).await?;
        check_preamble(&peer)?;
        debug!("stream negotiation complete");
        Ok(())
    }

    /// Encodes and writes one message, flushing it to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if encoding or the write fails.
    pub async fn send(&mut self, msg: &Message) -> Result<(), StreamError> {
        let bytes = encode_message(msg)?;
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Reads the next complete message.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly between
    /// messages.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Io`] with `UnexpectedEof` if the peer closed in the
    ///   middle of a frame, or any other transport failure.
    /// - [`StreamError::Protocol`] if the buffered bytes are not a valid frame.
    pub async fn recv(&mut self) -> Result<Option<Message>, StreamError> {
        let mut read_tmp = [0u8; READ_CHUNK];
        loop {
            match decode_message(&self.recv_buf) {
                Ok((msg, consumed)) => {
                    self.recv_buf.drain(..consumed);
                    return Ok(Some(msg));
                }
                // Normal: no full message buffered yet.
                Err(ProtocolError::InsufficientData { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            let n = self.inner.read(&mut read_tmp).await?;
            if n == 0 {
                if self.recv_buf.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection mid-message",
                )
                .into());
            }
            self.recv_buf.extend_from_slice(&read_tmp[..n]);
        }
    }

    /// Shuts down the write side of the transport.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Io`] if the transport reports a failure.
    pub async fn shutdown(&mut self) -> Result<(), StreamError> {
        self.inner.shutdown().await?;
        Ok(())
    }

    /// Returns a reference to the underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
