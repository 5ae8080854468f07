//! Infrastructure layer for rterm-server.
//!
//! - [`listener`] – binds the port and spawns one handler task per connection.
//! - [`handler`]  – serves a single connection from negotiation to close.

pub mod handler;
pub mod listener;

pub use handler::{ConnectionHandler, HandlerOutcome, HandlerState};
pub use listener::{ListenError, Listener};
