use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::RadioStream;

/// Port radios listen on for the framed stream API over TCP.
pub const DEFAULT_TCP_PORT: u16 = 4403;

/// Connect to a network-attached radio (blocking).
///
/// `addr` is `host` or `host:port`; a bare host uses [`DEFAULT_TCP_PORT`].
pub fn connect(addr: &str, timeout: Option<Duration>) -> Result<RadioStream> {
    let addr = with_default_port(addr);
    let resolved = addr
        .to_socket_addrs()
        .map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?
        .collect::<Vec<_>>();

    let mut last_err = None;
    for candidate in &resolved {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!(%addr, peer = %candidate, "connected to radio over tcp");
                return Ok(RadioStream::from_tcp(stream));
            }
            Err(err) => last_err = Some(err),
        }
    }

    match last_err {
        Some(source) => Err(TransportError::Connect { addr, source }),
        None => Err(TransportError::Unresolved(addr)),
    }
}

/// Append [`DEFAULT_TCP_PORT`] when `addr` carries no port.
pub fn with_default_port(addr: &str) -> String {
    let has_port = match addr.rsplit_once(':') {
        // Bracketed IPv6 literal: "[::1]:4403" has a port, "[::1]" does not.
        Some((host, port)) if !host.is_empty() => {
            !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!host.contains(':') || host.ends_with(']'))
        }
        _ => false,
    };
    if has_port {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_TCP_PORT}")
    }
}
