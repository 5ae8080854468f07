//! The rterm command grammar.
//!
//! A valid command is a dash, one of six service names, and an optional
//! argument introduced by a second dash:
//!
//! ```text
//! -(end|echo|time|date|help|cls)(-<text>)?
//! ```
//!
//! `<text>` is one or more characters, none of which is a line terminator.
//! The whole input must match; `-timer` or ` -time` are rejected.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

const COMMAND_PATTERN: &str =
    r"^-(end|echo|time|date|help|cls)(?:-([^\n\r\x{85}\x{2028}\x{2029}]+))?$";

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant covered by the tests below.
    RE.get_or_init(|| Regex::new(COMMAND_PATTERN).expect("command pattern is valid"))
}

/// The six services a server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    End,
    Echo,
    Time,
    Date,
    Help,
    Cls,
}

impl Service {
    /// Every service, in the order the help listing prints them.
    pub const ALL: [Service; 6] = [
        Service::End,
        Service::Echo,
        Service::Time,
        Service::Date,
        Service::Help,
        Service::Cls,
    ];

    /// The name used on the command line (without the leading dash).
    pub fn name(self) -> &'static str {
        match self {
            Service::End => "end",
            Service::Echo => "echo",
            Service::Time => "time",
            Service::Date => "date",
            Service::Help => "help",
            Service::Cls => "cls",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Service::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub service: Service,
    /// Text after the second dash, if any.  Never empty when present.
    pub argument: Option<String>,
}

/// Validates `input` against the grammar.
///
/// Returns `None` for anything that does not match; the caller answers such
/// input with the unrecognized-command response and keeps the connection open.
///
/// ```rust
/// use rterm_core::{parse_command, Service};
///
/// let req = parse_command("-echo-hello world").unwrap();
/// assert_eq!(req.service, Service::Echo);
/// assert_eq!(req.argument.as_deref(), Some("hello world"));
///
/// assert!(parse_command("foobar").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ServiceRequest> {
    let caps = command_regex().captures(input)?;
    let service = Service::from_name(caps.get(1)?.as_str())?;
    let argument = caps.get(2).map(|m| m.as_str().to_owned());
    Some(ServiceRequest { service, argument })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
