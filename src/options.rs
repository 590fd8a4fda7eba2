//! Connection options.
//!
//! Provides a type-safe interface for configuring a connection attempt:
//! extra handshake headers, the minimum accepted TLS protocol version, and
//! the certificate verification mode.
//!
//! # Example
//!
//! ```ignore
//! use sync_websocket::{ConnectOptions, TlsVersion, VerifyMode};
//!
//! let options = ConnectOptions::new()
//!     .with_header("Authorization", "Bearer ...")
//!     .with_tls_version(TlsVersion::Tlsv12)
//!     .with_verify_mode(VerifyMode::Peer);
//! ```

// ============================================================================
// TlsVersion
// ============================================================================

/// Minimum TLS protocol version accepted for a secured connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    /// TLS 1.0.
    Tlsv10,
    /// TLS 1.1.
    Tlsv11,
    /// TLS 1.2.
    Tlsv12,
}

impl From<TlsVersion> for native_tls::Protocol {
    fn from(version: TlsVersion) -> Self {
        match version {
            TlsVersion::Tlsv10 => native_tls::Protocol::Tlsv10,
            TlsVersion::Tlsv11 => native_tls::Protocol::Tlsv11,
            TlsVersion::Tlsv12 => native_tls::Protocol::Tlsv12,
        }
    }
}

// ============================================================================
// VerifyMode
// ============================================================================

/// Certificate verification mode for a secured connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifyMode {
    /// Verify the peer certificate chain and hostname.
    #[default]
    Peer,
    /// Accept any certificate and hostname. Only for test endpoints.
    None,
}

// ============================================================================
// ConnectOptions
// ============================================================================

/// Configuration for a single connection attempt.
///
/// Headers are forwarded to the protocol engine before the handshake starts;
/// the TLS fields only apply to `wss`/`https` URLs.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Extra handshake headers, applied in insertion order.
    pub headers: Vec<(String, String)>,

    /// Minimum accepted TLS protocol version. `None` uses the platform default.
    pub tls_version: Option<TlsVersion>,

    /// Certificate verification mode.
    pub verify_mode: VerifyMode,
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectOptions {
    /// Creates a new options instance with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
            tls_version: None,
            verify_mode: VerifyMode::Peer,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectOptions {
    /// Adds a handshake header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds multiple handshake headers.
    #[inline]
    #[must_use]
    pub fn with_headers(
        mut self,
        headers: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the minimum accepted TLS protocol version.
    #[inline]
    #[must_use]
    pub fn with_tls_version(mut self, version: TlsVersion) -> Self {
        self.tls_version = Some(version);
        self
    }

    /// Sets the certificate verification mode.
    #[inline]
    #[must_use]
    pub fn with_verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
