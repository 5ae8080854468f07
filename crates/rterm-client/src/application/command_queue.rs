//! Command queue: the hand-off point between whoever types commands and the
//! session task that sends them.
//!
//! Any number of [`CommandSender`] clones may enqueue concurrently; enqueueing
//! never blocks and the queue has no bound.  Exactly one [`CommandQueue`]
//! consumes, in FIFO order, and suspends on an empty queue until a command
//! arrives.
//!
//! A queue lives as long as one session.  Once the session closes its end,
//! every further [`CommandSender::enqueue`] fails with [`QueueError::Closed`].

use thiserror::Error;
use tokio::sync::mpsc;

/// Error returned when the consuming session is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("the command queue is closed; the session has ended")]
    Closed,
}

/// Producer side of the queue.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSender {
    /// Appends `command` to the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the consumer has closed or dropped
    /// its end.
    pub fn enqueue(&self, command: impl Into<String>) -> Result<(), QueueError> {
        self.tx.send(command.into()).map_err(|_| QueueError::Closed)
    }

    /// Returns `true` once the consumer can no longer receive commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the queue.
#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<String>,
}

impl CommandQueue {
    /// Removes and returns the oldest command, waiting until one exists.
    ///
    /// Returns `None` once every [`CommandSender`] is dropped and the queue
    /// is drained.
    pub async fn dequeue(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Rejects all further enqueues.  Commands already queued are discarded
    /// when the queue is dropped.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Creates a fresh, empty queue.
pub fn command_queue() -> (CommandSender, CommandQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandQueue { rx })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
