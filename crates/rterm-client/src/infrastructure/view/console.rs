//! Console terminal view.
//!
//! Writes each line to the wrapped writer (stdout in the binary).  Clearing
//! emits the ANSI "erase display, cursor home" sequence.  Connection status
//! changes are logged rather than printed, since a console has no controls
//! to enable or disable.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::{info, warn};

use crate::application::terminal::{ConnectionStatus, TerminalView};

/// ANSI: erase the whole display, then move the cursor to the top-left.
pub const CLEAR_SEQUENCE: &str = "\x1b[2J\x1b[H";

/// A [`TerminalView`] that writes to any `Write` sink.
pub struct ConsoleView<W> {
    out: Mutex<W>,
}

impl ConsoleView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self, text: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!("failed to write to the console: {e}");
        }
    }
}

impl<W: Write + Send> TerminalView for ConsoleView<W> {
    fn append_line(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    fn set_connection_state(&self, status: ConnectionStatus) {
        info!(?status, "connection status changed");
    }

    fn clear(&self) {
        self.write(CLEAR_SEQUENCE);
    }
}
