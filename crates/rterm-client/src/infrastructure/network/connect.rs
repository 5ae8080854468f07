//! Opening the TCP connection from user-entered text.
//!
//! Checks run in a fixed order, and each failure maps to its own
//! [`SessionError`]:
//!
//! 1. the port text must be an integer        → [`SessionError::InvalidPort`]
//! 2. the host must resolve                   → [`SessionError::UnknownHost`]
//! 3. the port must fit in `0..=65535`        → [`SessionError::PortOutOfRange`]
//! 4. the connection must open within the timeout
//!
//! An unresolvable host never opens a socket.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use super::SessionError;

/// Parses the port text exactly as typed.  Range is checked separately.
///
/// # Errors
///
/// Returns [`SessionError::InvalidPort`] if `text` is not an integer.
pub fn parse_port(text: &str) -> Result<i32, SessionError> {
    text.parse::<i32>()
        .map_err(|_| SessionError::InvalidPort(text.to_owned()))
}

/// Resolves `host` to its addresses.
///
/// # Errors
///
/// Returns [`SessionError::UnknownHost`] if resolution fails or yields no
/// address.
pub async fn resolve(host: &str) -> Result<Vec<SocketAddr>, SessionError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, 0))
        .await
        .map_err(|e| SessionError::UnknownHost {
            host: host.to_owned(),
            source: Some(e),
        })?
        .collect();
    if addrs.is_empty() {
        return Err(SessionError::UnknownHost {
            host: host.to_owned(),
            source: None,
        });
    }
    Ok(addrs)
}

/// Runs the full connect sequence and returns the open socket.
///
/// Every resolved address is tried in order; the whole attempt is bounded
/// by `limit`.
///
/// # Errors
///
/// Any of the connect-phase [`SessionError`] variants, see the module docs.
pub async fn open_socket(
    host: &str,
    port_text: &str,
    limit: Duration,
) -> Result<TcpStream, SessionError> {
    let port = parse_port(port_text)?;
    let addrs = resolve(host).await?;
    let port = u16::try_from(port).map_err(|_| SessionError::PortOutOfRange(port))?;

    let attempt = async {
        let mut last_err = None;
        for mut addr in addrs {
            addr.set_port(port);
            match TcpStream::connect(addr).await {
                Ok(socket) => return Ok(socket),
                Err(e) => {
                    debug!("connect to {addr} failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable)))
    };

    match tokio::time::timeout(limit, attempt).await {
        Ok(Ok(socket)) => Ok(socket),
        Ok(Err(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(SessionError::PermissionDenied(e))
        }
        Ok(Err(e)) => Err(SessionError::Refused(e)),
        Err(_) => Err(SessionError::ConnectTimeout(limit)),
    }
}
