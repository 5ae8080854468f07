//! All rterm protocol message types.
//!
//! Every message carries exactly one piece of UTF-8 text.  Commands travel
//! client → server, responses travel server → client.  Two response values are
//! reserved as control signals and are surfaced as dedicated [`Response`]
//! variants so neither peer ever compares against raw strings.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload either peer will accept.
pub const MAX_PAYLOAD_LEN: usize = 1024 * 1024;

/// Magic bytes opening the preamble each peer sends during stream negotiation.
pub const PREAMBLE_MAGIC: [u8; 4] = *b"RTRM";

/// Preamble size: magic + version byte.
pub const PREAMBLE_SIZE: usize = PREAMBLE_MAGIC.len() + 1;

/// Wire text of the clear-display control signal.
pub const CLEAR_TOKEN: &str = "cls";

/// Wire text of the end-session control signal.
pub const END_TOKEN: &str = "end";

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type codes carried in byte 1 of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Command = 0x01,
    Response = 0x02,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::Command),
            0x02 => Ok(MessageType::Response),
            _ => Err(()),
        }
    }
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// A server response as seen by both ends of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Plain text to show to the user.
    Data(String),
    /// Instructs the client to discard everything it has displayed so far.
    ClearSignal,
    /// The server has finished the session; no further requests are accepted.
    EndSignal,
}

impl Response {
    /// Interprets response text received from the wire.
    ///
    /// ```rust
    /// use rterm_core::Response;
    ///
    /// assert_eq!(Response::from_wire("cls".to_string()), Response::ClearSignal);
    /// assert_eq!(Response::from_wire("ECHO:hi".to_string()), Response::Data("ECHO:hi".into()));
    /// ```
    pub fn from_wire(text: String) -> Self {
        match text.as_str() {
            CLEAR_TOKEN => Response::ClearSignal,
            END_TOKEN => Response::EndSignal,
            _ => Response::Data(text),
        }
    }

    /// Returns the text this response is transmitted as.
    pub fn wire_text(&self) -> &str {
        match self {
            Response::Data(text) => text,
            Response::ClearSignal => CLEAR_TOKEN,
            Response::EndSignal => END_TOKEN,
        }
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Every message that can travel over an rterm connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A raw command line typed by the user.  Validation happens on the server.
    Command(String),
    /// The server's answer to the immediately preceding command.
    Response(Response),
}

impl Message {
    /// Returns the [`MessageType`] code for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Command(_) => MessageType::Command,
            Message::Response(_) => MessageType::Response,
        }
    }

    /// Returns the text payload of this message.
    pub fn text(&self) -> &str {
        match self {
            Message::Command(text) => text,
            Message::Response(response) => response.wire_text(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
