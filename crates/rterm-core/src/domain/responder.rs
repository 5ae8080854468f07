//! Responder: the dispatch table that turns a command line into a reply.
//!
//! | command          | response                                     |
//! |------------------|----------------------------------------------|
//! | `-echo-<text>`   | `ECHO:<text>`                                |
//! | `-echo`          | `ECHO:`                                      |
//! | `-time`          | `TIME: hh:mm:ss AM/PM`                       |
//! | `-date`          | `DATE: d Month yyyy`                         |
//! | `-help`          | the service listing                          |
//! | `-cls`           | [`Response::ClearSignal`]                    |
//! | `-end`           | [`Reply::End`]                               |
//! | anything else    | `ERROR: Unrecognized command.`               |

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::domain::grammar::{parse_command, Service};
use crate::protocol::messages::Response;

/// Response text for input that does not match the grammar.
pub const UNRECOGNIZED_RESPONSE: &str = "ERROR: Unrecognized command.";

/// `strftime` pattern for the `-time` service (`hh:mm:ss AM/PM`).
pub const TIME_FORMAT: &str = "%I:%M:%S %p";

/// `strftime` pattern for the `-date` service (`d Month yyyy`).
pub const DATE_FORMAT: &str = "%-d %B %Y";

/// Source of the wall-clock time used by `-time` and `-date`.
pub trait Clock: Send + Sync {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// [`Clock`] backed by the host's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// What the server should do after reading one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this response and keep serving.
    Respond(Response),
    /// Stop serving; the caller sends [`Response::EndSignal`] as the final message.
    End,
}

/// Computes replies for incoming commands.
///
/// Cheap to clone; every connection handler holds its own copy.
#[derive(Clone)]
pub struct Responder {
    clock: Arc<dyn Clock>,
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Responder {
    /// Creates a responder reading the time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Computes the reply for one raw command line.
    ///
    /// Never fails: malformed input is answered with
    /// [`UNRECOGNIZED_RESPONSE`].
    pub fn reply(&self, command: &str) -> Reply {
        let Some(request) = parse_command(command) else {
            return Reply::Respond(Response::Data(UNRECOGNIZED_RESPONSE.to_owned()));
        };

        let text = match request.service {
            Service::Echo => format!("ECHO:{}", request.argument.unwrap_or_default()),
            Service::Time => format!("TIME: {}", self.clock.now().format(TIME_FORMAT)),
            Service::Date => format!("DATE: {}", self.clock.now().format(DATE_FORMAT)),
            Service::Help => help_text(),
            Service::Cls => return Reply::Respond(Response::ClearSignal),
            Service::End => return Reply::End,
        };
        Reply::Respond(Response::Data(text))
    }
}

/// The `-help` listing: a title line followed by one service name per line.
pub fn help_text() -> String {
    let mut text = String::from("Available Services:\n");
    for service in Service::ALL {
        text.push_str(service.name());
        text.push('\n');
    }
    text
}

// ── Tests ─────────────────────────────────────────────────────────────────────
