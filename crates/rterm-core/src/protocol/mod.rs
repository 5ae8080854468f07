//! Protocol module containing message types, the binary codec, and the
//! framed message stream used by both peers.

pub mod codec;
pub mod messages;
pub mod stream;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::*;
pub use stream::{MessageStream, StreamError};
