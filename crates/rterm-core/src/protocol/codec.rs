//! Binary codec for encoding and decoding rterm protocol messages.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][payload:N]
//! ```
//! Total header size: 8 bytes. `payload_len` is big-endian; the payload is UTF-8.
//!
//! Before the first message each peer sends a preamble:
//! ```text
//! [magic:"RTRM"][version:1]
//! ```

use crate::protocol::messages::{
    Message, MessageType, Response, HEADER_SIZE, MAX_PAYLOAD_LEN, PREAMBLE_MAGIC, PREAMBLE_SIZE,
    PROTOCOL_VERSION,
};
use thiserror::Error;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header or preamble is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The peer's preamble does not start with the rterm magic bytes.
    #[error("peer does not speak the rterm protocol")]
    BadPreamble,

    /// The payload is not valid UTF-8.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The declared or supplied payload exceeds [`MAX_PAYLOAD_LEN`].
    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD_LEN}-byte limit")]
    PayloadTooLarge(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] into a byte vector including the 8-byte header.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if the text exceeds
/// [`MAX_PAYLOAD_LEN`] bytes.
///
/// # Examples
///
/// ```rust
/// use rterm_core::protocol::{encode_message, decode_message, Message};
///
/// let msg = Message::Command("-echo-hi".to_string());
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = msg.text().as_bytes();
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push(msg.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes one [`Message`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when `bytes` does not yet hold a
/// complete frame; any other variant means the stream is corrupt.
pub fn decode_message(bytes: &[u8]) -> Result<(Message, usize), ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let msg_type_byte = bytes[1];
    let msg_type = MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload_len));
    }

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    let text = std::str::from_utf8(&bytes[HEADER_SIZE..total_needed])
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?
        .to_owned();

    let msg = match msg_type {
        MessageType::Command => Message::Command(text),
        MessageType::Response => Message::Response(Response::from_wire(text)),
    };
    Ok((msg, total_needed))
}

/// Returns the preamble this peer sends during stream negotiation.
pub fn encode_preamble() -> [u8; PREAMBLE_SIZE] {
    let mut buf = [0u8; PREAMBLE_SIZE];
    buf[..PREAMBLE_MAGIC.len()].copy_from_slice(&PREAMBLE_MAGIC);
    buf[PREAMBLE_MAGIC.len()] = PROTOCOL_VERSION;
    buf
}

/// Validates a preamble received from the peer.
///
/// # Errors
///
/// Returns [`ProtocolError::BadPreamble`] for foreign magic bytes and
/// [`ProtocolError::UnsupportedVersion`] for a mismatched version.
pub fn check_preamble(bytes: &[u8; PREAMBLE_SIZE]) -> Result<(), ProtocolError> {
    if bytes[..PREAMBLE_MAGIC.len()] != PREAMBLE_MAGIC {
        return Err(ProtocolError::BadPreamble);
    }
    let version = bytes[PREAMBLE_MAGIC.len()];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
