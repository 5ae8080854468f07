//! [`TerminalView`](crate::application::TerminalView) implementations.
//!
//! | View            | Used by                                   |
//! |-----------------|-------------------------------------------|
//! | `ConsoleView`   | the `rterm-client` binary (stdout)        |
//! | `RecordingView` | tests; records every call for inspection  |

pub mod console;
pub mod recording;

pub use console::ConsoleView;
pub use recording::RecordingView;
