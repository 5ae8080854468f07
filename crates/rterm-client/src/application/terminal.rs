//! Terminal controller and the view it drives.
//!
//! [`TerminalView`] is everything a front end has to offer: show a line,
//! reflect the connection status, and clear its output.  The controller and
//! the session only ever talk to the front end through this trait, so the
//! same core drives the console view, the recording view in tests, or any
//! graphical front end.
//!
//! [`TerminalController`] holds the connect/send availability rules of the
//! terminal form: connect is only possible while no session is live, send
//! only while one is.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::application::command_queue::{CommandSender, QueueError};
use crate::domain::ClientConfig;
use crate::infrastructure::network::{spawn_session, ConnectionState, SessionHandle};

/// Connection status as shown by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Output sink of the terminal.
///
/// Implementations are called from the session task and must be cheap and
/// non-blocking.
#[cfg_attr(test, mockall::automock)]
pub trait TerminalView: Send + Sync {
    /// Appends one line of output.
    fn append_line(&self, text: &str);

    /// Updates the connect/send controls.
    ///
    /// `Connected` is reported as soon as a connect attempt starts;
    /// `Disconnected` when the attempt fails or the session closes.
    fn set_connection_state(&self, status: ConnectionStatus);

    /// Discards all previously appended output.
    fn clear(&self);
}

/// Error type for [`TerminalController`] actions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerminalError {
    #[error("a session is already running")]
    AlreadyConnected,

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Connects, sends, and tracks the current session.
pub struct TerminalController {
    view: Arc<dyn TerminalView>,
    config: ClientConfig,
    session: Option<SessionHandle>,
}

impl TerminalController {
    pub fn new(view: Arc<dyn TerminalView>, config: ClientConfig) -> Self {
        Self {
            view,
            config,
            session: None,
        }
    }

    /// Starts a new session to `host` on `port_text`.
    ///
    /// Validation of the host and port happens inside the session; failures
    /// are shown through the view, not returned here.  Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::AlreadyConnected`] while a session is live.
    pub fn connect(&mut self, host: &str, port_text: &str) -> Result<(), TerminalError> {
        if !self.can_connect() {
            return Err(TerminalError::AlreadyConnected);
        }
        self.session = Some(spawn_session(
            host,
            port_text,
            &self.config,
            Arc::clone(&self.view),
        ));
        Ok(())
    }

    /// Queues `command` for the live session.
    ///
    /// # Errors
    ///
    /// - [`TerminalError::NotConnected`] if no session is live.
    /// - [`TerminalError::Queue`] if the session closed in the meantime.
    pub fn send(&self, command: &str) -> Result<(), TerminalError> {
        self.sender()
            .ok_or(TerminalError::NotConnected)?
            .enqueue(command)?;
        Ok(())
    }

    /// A producer handle for the live session's queue, for callers that
    /// enqueue from several tasks.
    pub fn sender(&self) -> Option<&CommandSender> {
        self.session
            .as_ref()
            .filter(|s| s.is_live())
            .map(SessionHandle::commands)
    }

    pub fn can_connect(&self) -> bool {
        !self.can_send()
    }

    pub fn can_send(&self) -> bool {
        self.session.as_ref().is_some_and(SessionHandle::is_live)
    }

    /// State of the most recent session, `Idle` if there never was one.
    pub fn state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map_or(ConnectionState::Idle, SessionHandle::state)
    }

    /// Observes the most recent session's state changes.
    pub fn subscribe(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.session.as_ref().map(SessionHandle::subscribe)
    }

    /// Waits until the current session reaches its final state.  Returns
    /// immediately if there is none.
    pub async fn closed(&self) -> ConnectionState {
        match &self.session {
            Some(session) => session.closed().await,
            None => ConnectionState::Idle,
        }
    }

    /// Stops taking commands, lets the session send what is already queued,
    /// and waits for it to close.
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.finish().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    /// A view that expects exactly one failed connect attempt showing `line`.
    fn view_expecting_failed_connect(line: &'static str) -> MockTerminalView {
        let mut view = MockTerminalView::new();
        let mut seq = Sequence::new();
        view.expect_set_connection_state()
            .with(eq(ConnectionStatus::Connected))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        view.expect_append_line()
            .with(eq(line))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        view.expect_set_connection_state()
            .with(eq(ConnectionStatus::Disconnected))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        view.expect_clear().never();
        view
    }

    #[test]
    fn test_new_controller_can_connect_but_not_send() {
        let controller =
            TerminalController::new(Arc::new(MockTerminalView::new()), ClientConfig::default());

        assert!(controller.can_connect());
        assert!(!controller.can_send());
        assert_eq!(controller.state(), ConnectionState::Idle);
        assert_eq!(controller.send("-time"), Err(TerminalError::NotConnected));
    }

    #[tokio::test]
    async fn test_invalid_port_reports_and_reenables_connect() {
        // Arrange
        let view = view_expecting_failed_connect("CLIENT>ERROR: Invalid port number.");
        let mut controller = TerminalController::new(Arc::new(view), ClientConfig::default());

        // Act
        controller.connect("localhost", "not-a-port").unwrap();
        let final_state = controller.closed().await;

        // Assert
        assert_eq!(final_state, ConnectionState::Idle);
        assert!(controller.can_connect());
        assert!(!controller.can_send());
    }

    #[tokio::test]
    async fn test_unknown_host_reports_and_reenables_connect() {
        let view = view_expecting_failed_connect("CLIENT>ERROR: Unknown Host.");
        let mut controller = TerminalController::new(Arc::new(view), ClientConfig::default());

        controller.connect("nope.invalid", "9000").unwrap();

        assert_eq!(controller.closed().await, ConnectionState::Idle);
        assert!(controller.can_connect());
    }

    #[tokio::test]
    async fn test_connect_while_attempt_in_flight_is_refused() {
        // Arrange: a listener that accepts but never negotiates keeps the
        // session in StreamNegotiation
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        let mut view = MockTerminalView::new();
        view.expect_set_connection_state().return_const(());
        view.expect_append_line().return_const(());
        let config = ClientConfig {
            negotiation_timeout_ms: 300,
            ..ClientConfig::default()
        };
        let mut controller = TerminalController::new(Arc::new(view), config);

        // Act
        controller.connect("127.0.0.1", &port).unwrap();
        let second = controller.connect("127.0.0.1", &port);

        // Assert
        assert_eq!(second, Err(TerminalError::AlreadyConnected));
        assert!(controller.can_send());
        assert_eq!(controller.closed().await, ConnectionState::Idle);
        assert!(controller.can_connect());
        drop(listener);
    }
}
