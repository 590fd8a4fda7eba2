//! Protocol engine interface.
//!
//! The WebSocket wire protocol — handshake construction, framing, masking —
//! is not implemented by this crate. It is consumed through the
//! [`ProtocolEngine`] trait: the client feeds the engine raw bytes from the
//! socket and caller payloads, and the engine hands back bytes to write and
//! decoded [`Event`]s through an [`EngineSink`].
//!
//! # Driving an engine
//!
//! Every engine call may produce output in the sink; the driver drains both
//! halves after each call:
//!
//! ```ignore
//! let mut sink = EngineSink::new();
//! engine.parse(&buf[..n], &mut sink);
//! let (output, events) = sink.into_parts();
//! connection.write(&bus, &output);
//! for event in events {
//!     connection.apply_engine_event(&bus, event);
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Received [`Message`] and outgoing [`Payload`] types |

// ============================================================================
// Submodules
// ============================================================================

/// Received message and outgoing payload types.
pub mod message;

pub use message::{Message, Payload};

// ============================================================================
// Event Types
// ============================================================================

/// An event decoded by the protocol engine, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The protocol handshake completed; the connection is open.
    Open,
    /// A complete text or binary frame arrived.
    Message(Message),
    /// The engine reported a protocol error.
    Error(String),
    /// The connection closed, with an optional error description.
    Close(Option<String>),
}

impl Event {
    /// Returns the kind used to route this event through the bus.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Message(_) => EventKind::Message,
            Self::Error(_) => EventKind::Error,
            Self::Close(_) => EventKind::Close,
        }
    }
}

/// Event name used for listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handshake completed.
    Open,
    /// Frame received.
    Message,
    /// Protocol error reported.
    Error,
    /// Connection closed.
    Close,
}

// ============================================================================
// EngineSink
// ============================================================================

/// Collects the output of a protocol engine call.
///
/// Engines append outgoing wire bytes with [`write`](Self::write) and decoded
/// events with [`emit`](Self::emit); the driver drains both after each call.
/// Events are delivered in emission order.
#[derive(Debug, Default)]
pub struct EngineSink {
    output: Vec<u8>,
    events: Vec<Event>,
}

impl EngineSink {
    /// Creates an empty sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes destined for the socket.
    #[inline]
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.output.extend_from_slice(bytes.as_ref());
    }

    /// Records a decoded event.
    #[inline]
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Returns `true` if the sink holds neither output nor events.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.events.is_empty()
    }

    /// Consumes the sink, returning the collected output and events.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<Event>) {
        (self.output, self.events)
    }
}

// ============================================================================
// ProtocolEngine
// ============================================================================

/// The WebSocket handshake/framing engine consumed by the client.
///
/// Implementations own all handshake state. Calls arrive from two threads —
/// the caller thread (`start`, `text`, `binary`, `close`, `set_header`) and
/// the reader thread (`parse`) — but never concurrently; the client
/// serializes access behind a mutex.
pub trait ProtocolEngine: Send + 'static {
    /// Records a handshake header. Called before [`start`](Self::start).
    fn set_header(&mut self, name: &str, value: &str);

    /// Begins the handshake, emitting the opening bytes into `sink`.
    fn start(&mut self, sink: &mut EngineSink);

    /// Feeds raw bytes read from the socket.
    ///
    /// Synchronously emits zero or more events — `Open` once the handshake
    /// completes, `Message` per decoded frame, `Error` on protocol
    /// violations, `Close` when a close frame is processed — and may emit
    /// reply bytes (e.g. close acknowledgments).
    fn parse(&mut self, data: &[u8], sink: &mut EngineSink);

    /// Encodes a text frame.
    fn text(&mut self, payload: &str, sink: &mut EngineSink);

    /// Encodes a binary frame.
    fn binary(&mut self, payload: &[u8], sink: &mut EngineSink);

    /// Begins the protocol close handshake.
    fn close(&mut self, sink: &mut EngineSink);
}

// ============================================================================
// Tests
// ============================================================================
