//! Infrastructure layer for rterm-client.
//!
//! - [`network`] – socket setup and the per-connection session task.
//! - [`view`]    – [`TerminalView`](crate::application::TerminalView)
//!   implementations.

pub mod network;
pub mod view;
