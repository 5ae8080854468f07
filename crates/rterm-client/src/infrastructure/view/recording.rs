//! Recording terminal view for tests.
//!
//! Every call is recorded in memory so assertions can inspect exactly what
//! the session showed and in what order.  `clear` really discards the
//! recorded lines, the same as a front end resetting its output.
//!
//! ```ignore
//! let view = Arc::new(RecordingView::new());
//! let session = spawn_session("127.0.0.1", "9000", &config, view.clone());
//! session.commands().enqueue("-echo-hi")?;
//! session.commands().enqueue("-end")?;
//! session.closed().await;
//! assert_eq!(view.lines()[1], "SERVER>ECHO:hi");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::terminal::{ConnectionStatus, TerminalView};

/// A view that records calls instead of displaying anything.
#[derive(Debug, Default)]
pub struct RecordingView {
    lines: Mutex<Vec<String>>,
    statuses: Mutex<Vec<ConnectionStatus>>,
    clears: AtomicUsize,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines appended since the last `clear`, oldest first.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Every status reported, oldest first.
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        lock(&self.statuses).clone()
    }

    /// How many times `clear` was called.
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl TerminalView for RecordingView {
    fn append_line(&self, text: &str) {
        lock(&self.lines).push(text.to_owned());
    }

    fn set_connection_state(&self, status: ConnectionStatus) {
        lock(&self.statuses).push(status);
    }

    fn clear(&self) {
        lock(&self.lines).clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// A panicking test thread must not hide what was recorded before it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_lines_in_order() {
        let view = RecordingView::new();
        view.append_line("a");
        view.append_line("b");
        assert_eq!(view.lines(), ["a", "b"]);
    }

    #[test]
    fn test_clear_leaves_no_prior_content() {
        // Arrange
        let view = RecordingView::new();
        view.append_line("old");

        // Act
        view.clear();
        view.append_line("new");

        // Assert
        assert_eq!(view.lines(), ["new"]);
        assert_eq!(view.clear_count(), 1);
    }

    #[test]
    fn test_records_status_changes() {
        let view = RecordingView::new();
        view.set_connection_state(ConnectionStatus::Connected);
        view.set_connection_state(ConnectionStatus::Disconnected);
        assert_eq!(
            view.statuses(),
            [ConnectionStatus::Connected, ConnectionStatus::Disconnected]
        );
    }
}
