//! rterm-client library crate.
//!
//! # Architecture
//!
//! ```text
//! stdin / front end
//!       ↓ send(command)
//! [rterm-client]
//!   ├── domain/           ClientConfig and its TOML loader
//!   ├── application/
//!   │     ├── command_queue/  unbounded FIFO between producers and the session
//!   │     └── terminal/       TerminalView trait, TerminalController
//!   └── infrastructure/
//!         ├── network/    connect + session task (one per connection)
//!         └── view/       console and recording TerminalView implementations
//!       ↕ framed text messages over TCP
//! rterm-server
//! ```

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: command queue and terminal controller.
pub mod application;

/// Infrastructure layer: TCP session and view implementations.
pub mod infrastructure;
