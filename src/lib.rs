//! Blocking WebSocket client facade over a pluggable protocol engine.
//!
//! This library turns an event-driven WebSocket connection into plain
//! blocking calls: `connect` returns once the handshake opens,
//! `sync_text`/`sync_binary` return the next reply, and `close` returns with
//! the reader thread joined and the socket released. The wire protocol
//! itself — handshake construction, framing, masking — is delegated to a
//! [`ProtocolEngine`] implementation supplied by the caller; this crate owns
//! the part that is genuinely hard to get right: the bridge between one
//! background reader thread and deterministic, timeout-bounded waits on the
//! calling thread.
//!
//! # Architecture
//!
//! - Exactly two threads per connection: the caller's, and one `ws-reader`
//!   thread pumping bytes into the engine.
//! - Engine events (`Open`, `Message`, `Error`, `Close`) fan out through an
//!   [`EventBus`]; blocking calls park on a [`Waiter`] subscribed *before*
//!   the triggering frame is sent, so an early reply is never lost and a
//!   wait never burns its full timeout on success.
//! - `close()` cancels the in-flight read, joins the reader, and releases
//!   the socket before returning; exactly one `Close` event is observable.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use sync_websocket::{Client, ConnectOptions};
//!
//! let mut client = Client::connect(
//!     "wss://echo.example.com",
//!     engine, // your ProtocolEngine implementation
//!     ConnectOptions::new().with_header("Authorization", "Basic XXX"),
//!     Duration::from_secs(20),
//! )?;
//!
//! let reply = client.sync_text("hello world", Duration::from_secs(10))?;
//! assert_eq!(reply.as_text(), Some("hello world"));
//!
//! client.close(Duration::from_secs(20));
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | The blocking [`Client`] facade |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`options`] | [`ConnectOptions`] and TLS knobs |
//! | [`protocol`] | The consumed [`ProtocolEngine`] trait and event types |
//! | [`sync`] | [`EventBus`] and the [`Waiter`] park/wake bridge |
//! | [`transport`] | Socket establishment and the reader loop (internal) |

// ============================================================================
// Modules
// ============================================================================

/// The blocking client facade.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Connection options.
pub mod options;

/// Protocol engine interface and event types.
pub mod protocol;

/// Event dispatch and the blocking-call bridge.
pub mod sync;

/// Socket establishment, connection state, reader loop.
///
/// Internal module; only [`ConnectionState`] is part of the public surface.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    Client, DEFAULT_CLOSE_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT,
};

// Error types
pub use error::{Error, Result};

// Option types
pub use options::{ConnectOptions, TlsVersion, VerifyMode};

// Protocol types
pub use protocol::{EngineSink, Event, EventKind, Message, Payload, ProtocolEngine};

// Synchronization types
pub use sync::{EventBus, ListenerId, Waiter};

// Transport types
pub use transport::ConnectionState;
