//! Domain layer: the command grammar and the responder.
//!
//! Nothing in here performs I/O.  The current time is injected through the
//! [`responder::Clock`] trait so responses are fully deterministic in tests.

pub mod grammar;
pub mod responder;

pub use grammar::{parse_command, Service, ServiceRequest};
pub use responder::{Clock, Reply, Responder, SystemClock};
