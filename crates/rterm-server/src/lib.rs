//! rterm-server library crate.
//!
//! # Architecture
//!
//! ```text
//! rterm-client  (framed text messages over TCP)
//!         ↕
//! [rterm-server]
//!   ├── domain/           ServerConfig and its TOML loader
//!   └── infrastructure/
//!         ├── listener/   bind + accept loop, one task per connection
//!         └── handler/    per-connection negotiate → serve → close
//! ```
//!
//! The command grammar and response formatting live in `rterm-core`; this
//! crate only owns sockets and connection lifecycles.

/// Domain layer: configuration types.
pub mod domain;

/// Infrastructure layer: TCP listener and connection handlers.
pub mod infrastructure;
