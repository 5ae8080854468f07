//! # rterm-core
//!
//! Shared library for the rterm remote command terminal containing the wire
//! codec, the framed message stream, the command grammar, and the responder
//! that turns commands into responses.
//!
//! This crate is used by both the server and the client applications.
//!
//! # Architecture overview
//!
//! rterm is a tiny request/response terminal: a client sends one line of text
//! (a *command*), the server answers with one line of text (a *response*), and
//! only then may the client send the next command.
//!
//! - **`protocol`** – How text travels over the network.  Messages are framed
//!   with an 8-byte header and a UTF-8 payload, and both peers exchange a short
//!   preamble before the first message so a foreign peer is detected early.
//!
//! - **`domain`** – Pure logic with no I/O: the command grammar
//!   (`-echo`, `-time`, ...), the dispatch table, and the response formatting.

pub mod domain;
pub mod protocol;

pub use domain::grammar::{parse_command, Service, ServiceRequest};
pub use domain::responder::{Clock, Reply, Responder, SystemClock};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Message, Response};
pub use protocol::stream::{MessageStream, StreamError};
