//! Application layer for rterm-client.
//!
//! - [`command_queue`] – unbounded FIFO from user input to the session.
//! - [`terminal`]      – the [`TerminalView`] collaborator and the
//!   [`TerminalController`] that owns the current session.

pub mod command_queue;
pub mod terminal;

pub use command_queue::{command_queue, CommandQueue, CommandSender, QueueError};
pub use terminal::{ConnectionStatus, TerminalController, TerminalError, TerminalView};
