//! Socket establishment: resolution, bounded connect, TLS upgrade.
//!
//! A single absolute [`Deadline`] derived from the caller's timeout bounds
//! every step — DNS resolution, the TCP connect, and (for `wss`) the TLS
//! handshake. The connect is latency-sensitive framed traffic, so Nagle's
//! algorithm is disabled on every socket before it is returned.

// ============================================================================
// Imports
// ============================================================================

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::{ConnectOptions, VerifyMode};

// ============================================================================
// Deadline
// ============================================================================

/// An absolute point in time derived from `now + timeout`.
///
/// Carries the original timeout for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
    total_ms: u64,
}

impl Deadline {
    /// Creates a deadline `timeout` from now.
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            total_ms: timeout.as_millis() as u64,
        }
    }

    /// Time left before the deadline, zero if it has passed.
    pub(crate) fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Returns `true` once the deadline has passed.
    pub(crate) fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// The absolute instant, for condvar waits.
    pub(crate) fn instant(&self) -> Instant {
        self.at
    }

    /// The originally requested timeout in milliseconds.
    pub(crate) fn total_ms(&self) -> u64 {
        self.total_ms
    }
}

// ============================================================================
// Transport
// ============================================================================

/// The established byte stream, plain or TLS-wrapped.
pub(crate) enum Transport {
    /// Raw TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl Transport {
    fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(socket) => socket,
            Self::Tls(stream) => stream.get_ref(),
        }
    }

    /// Sets the receive timeout on the underlying socket.
    ///
    /// The reader loop uses a short timeout as its poll interval so the
    /// transport lock is never held across an unbounded read.
    pub(crate) fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.tcp().set_read_timeout(timeout)
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(socket) => socket.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(socket) => socket.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(socket) => socket.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Transport::Plain"),
            Self::Tls(_) => f.write_str("Transport::Tls"),
        }
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Resolves `host` and opens a TCP connection bounded by `deadline`.
///
/// Tries each resolved address with the remaining deadline. `TCP_NODELAY`
/// is set on the returned socket.
///
/// # Errors
///
/// - [`Error::Dns`] if resolution fails or yields no addresses
/// - [`Error::Refused`] if a peer actively refused
/// - [`Error::ConnectTimeout`] if the deadline elapsed first
pub(crate) fn connect(host: &str, port: u16, deadline: &Deadline) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|err| Error::dns(host, err))?
        .collect();
    if addrs.is_empty() {
        return Err(Error::dns(host, "host resolved to no addresses"));
    }
    trace!(host, port, candidates = addrs.len(), "host resolved");

    let mut refused = false;
    let mut last_err: Option<io::Error> = None;

    for addr in addrs {
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            break;
        }
        match TcpStream::connect_timeout(&addr, remaining) {
            Ok(socket) => {
                socket.set_nodelay(true)?;
                debug!(host, port, %addr, "tcp connected");
                return Ok(socket);
            }
            Err(err) if err.kind() == ErrorKind::ConnectionRefused => {
                trace!(%addr, "connection refused");
                refused = true;
            }
            Err(err) => {
                trace!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    if refused {
        return Err(Error::refused(host, port));
    }
    match last_err {
        Some(err) if !matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
            Err(Error::Io(err))
        }
        _ => Err(Error::connect_timeout(deadline.total_ms())),
    }
}

// ============================================================================
// TLS Upgrade
// ============================================================================

/// Wraps `socket` in a TLS session and completes the handshake before the
/// deadline.
///
/// `options.tls_version` sets the minimum accepted protocol version and
/// `options.verify_mode` controls certificate verification.
///
/// # Errors
///
/// - [`Error::Tls`] on connector setup or handshake failure
/// - [`Error::ConnectTimeout`] if the deadline elapses mid-handshake
pub(crate) fn upgrade_tls(
    socket: TcpStream,
    host: &str,
    options: &ConnectOptions,
    deadline: &Deadline,
) -> Result<TlsStream<TcpStream>> {
    let mut builder = TlsConnector::builder();
    if let Some(version) = options.tls_version {
        builder.min_protocol_version(Some(version.into()));
    }
    if options.verify_mode == VerifyMode::None {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let connector = builder.build().map_err(Error::tls)?;

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Err(Error::connect_timeout(deadline.total_ms()));
    }
    // Bound every handshake read/write by the remaining deadline.
    socket.set_read_timeout(Some(remaining))?;
    socket.set_write_timeout(Some(remaining))?;

    let mut attempt = connector.connect(host, socket);
    loop {
        match attempt {
            Ok(stream) => {
                debug!(host, "tls session established");
                stream.get_ref().set_write_timeout(None)?;
                return Ok(stream);
            }
            Err(HandshakeError::WouldBlock(mid)) => {
                if deadline.expired() {
                    return Err(Error::connect_timeout(deadline.total_ms()));
                }
                attempt = mid.handshake();
            }
            Err(HandshakeError::Failure(err)) => return Err(Error::tls(err)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
