//! Error types for the synchronous WebSocket client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use sync_websocket::{Client, ConnectOptions, Result};
//! use std::time::Duration;
//!
//! fn example() -> Result<()> {
//!     let mut client = Client::connect(
//!         "wss://echo.example.com",
//!         engine,
//!         ConnectOptions::new(),
//!         Duration::from_secs(20),
//!     )?;
//!     let reply = client.sync_text("ping", Duration::from_secs(10))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Addressing | [`Error::InvalidUrl`], [`Error::Dns`] |
//! | Connect | [`Error::Refused`], [`Error::ConnectTimeout`], [`Error::Tls`] |
//! | Handshake | [`Error::HandshakeTimeout`] |
//! | Blocking calls | [`Error::ResponseTimeout`], [`Error::UnsupportedPayload`] |
//! | External | [`Error::Io`] |
//!
//! Failures after the connection is open are never returned from client
//! methods; they surface through the `Error`/`Close` events instead.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Addressing Errors
    // ========================================================================
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Host name resolution failed.
    ///
    /// Returned when the host does not resolve to any address.
    #[error("Failed to resolve {host}: {message}")]
    Dns {
        /// Host that failed to resolve.
        host: String,
        /// Description of the resolver error.
        message: String,
    },

    // ========================================================================
    // Connect Errors
    // ========================================================================
    /// The peer actively refused the connection.
    #[error("Connection refused by {host}:{port}")]
    Refused {
        /// Host that refused.
        host: String,
        /// Port that refused.
        port: u16,
    },

    /// TCP connect did not complete within the deadline.
    #[error("Connect timed out after {timeout_ms}ms")]
    ConnectTimeout {
        /// Milliseconds allowed for the whole connect.
        timeout_ms: u64,
    },

    /// TLS setup or handshake failed.
    #[error("TLS error: {message}")]
    Tls {
        /// Description of the TLS failure.
        message: String,
    },

    // ========================================================================
    // Handshake Errors
    // ========================================================================
    /// Transport connected but the protocol handshake did not reach open.
    #[error("Handshake did not complete within {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds allowed for connect plus handshake.
        timeout_ms: u64,
    },

    // ========================================================================
    // Blocking Call Errors
    // ========================================================================
    /// A `sync_text`/`sync_binary` call saw no reply within its timeout.
    #[error("No reply within {timeout_ms}ms")]
    ResponseTimeout {
        /// Milliseconds waited for the reply.
        timeout_ms: u64,
    },

    /// The payload kind cannot be sent as the requested frame type.
    ///
    /// Returned by `sync_text`/`sync_binary` without waiting; the plain
    /// `send`/`text`/`binary` calls report the same condition as `false`.
    #[error("Payload kind cannot be framed")]
    UnsupportedPayload,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Unexpected IO error during connection establishment.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a DNS resolution error.
    #[inline]
    pub fn dns(host: impl Into<String>, message: impl ToString) -> Self {
        Self::Dns {
            host: host.into(),
            message: message.to_string(),
        }
    }

    /// Creates a connection refused error.
    #[inline]
    pub fn refused(host: impl Into<String>, port: u16) -> Self {
        Self::Refused {
            host: host.into(),
            port,
        }
    }

    /// Creates a connect timeout error.
    #[inline]
    pub fn connect_timeout(timeout_ms: u64) -> Self {
        Self::ConnectTimeout { timeout_ms }
    }

    /// Creates a TLS error.
    #[inline]
    pub fn tls(message: impl ToString) -> Self {
        Self::Tls {
            message: message.to_string(),
        }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout_ms: u64) -> Self {
        Self::HandshakeTimeout { timeout_ms }
    }

    /// Creates a response timeout error.
    #[inline]
    pub fn response_timeout(timeout_ms: u64) -> Self {
        Self::ResponseTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. }
                | Self::HandshakeTimeout { .. }
                | Self::ResponseTimeout { .. }
        )
    }

    /// Returns `true` if this error occurred while establishing the connection.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Dns { .. }
                | Self::Refused { .. }
                | Self::ConnectTimeout { .. }
                | Self::HandshakeTimeout { .. }
                | Self::Tls { .. }
                | Self::Io(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::refused("localhost", 1283);
        assert_eq!(err.to_string(), "Connection refused by localhost:1283");
    }

    #[test]
    fn test_dns_error_display() {
        let err = Error::dns("not-exist.host.com", "no such host");
        assert_eq!(
            err.to_string(),
            "Failed to resolve not-exist.host.com: no such host"
        );
    }

    #[test]
    fn test_is_timeout() {
        let connect = Error::connect_timeout(5000);
        let handshake = Error::handshake_timeout(20_000);
        let response = Error::response_timeout(10_000);
        let other = Error::refused("localhost", 80);

        assert!(connect.is_timeout());
        assert!(handshake.is_timeout());
        assert!(response.is_timeout());
        assert!(!other.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        let dns = Error::dns("host", "err");
        let refused = Error::refused("host", 80);
        let tls = Error::tls("bad certificate");
        let response = Error::response_timeout(1000);

        assert!(dns.is_connection_error());
        assert!(refused.is_connection_error());
        assert!(tls.is_connection_error());
        assert!(!response.is_connection_error());
    }

    #[test]
    fn test_response_timeout_not_connection_error() {
        let err = Error::response_timeout(10_000);
        assert!(err.is_timeout());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionReset, "reset by peer");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_connection_error());
    }
}
