//! Synchronous client facade.
//!
//! [`Client`] owns one connection and turns the engine's asynchronous event
//! stream into blocking calls: `connect` parks until the handshake opens,
//! `sync_text`/`sync_binary` park until the next message, `close` parks for
//! the close confirmation and then tears down unconditionally. Everything
//! else (`send`, `text`, `binary`) returns immediately.
//!
//! Exactly two threads touch a connection: whichever thread calls these
//! methods, and the `ws-reader` thread spawned per connection. The waiter a
//! blocking call parks on is always subscribed *before* the triggering
//! frame is sent, so a reply racing the park cannot be lost.
//!
//! One client, one connection: after `close()` the client is not reusable;
//! construct a new one to reconnect.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::options::ConnectOptions;
use crate::protocol::{EngineSink, Event, EventKind, Message, Payload, ProtocolEngine};
use crate::sync::bus::{EventBus, ListenerId};
use crate::sync::waiter::Waiter;
use crate::transport::connection::{Connection, ConnectionState};
use crate::transport::reader::{self, READ_POLL_INTERVAL};
use crate::transport::socket::{self, Deadline, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Default bound for `connect` (transport establishment plus handshake).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default bound for the close confirmation in `close`.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default bound for a `sync_text`/`sync_binary` reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Port implied by `wss`/`https` URLs without an explicit port.
const DEFAULT_SECURE_PORT: u16 = 443;

/// Port implied by `ws`/`http` URLs without an explicit port.
const DEFAULT_PLAIN_PORT: u16 = 80;

// ============================================================================
// Client
// ============================================================================

/// A blocking WebSocket client over a pluggable protocol engine.
///
/// # Example
///
/// ```ignore
/// use sync_websocket::{Client, ConnectOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT};
///
/// let mut client = Client::connect(
///     "wss://echo.example.com",
///     engine,
///     ConnectOptions::new(),
///     DEFAULT_CONNECT_TIMEOUT,
/// )?;
///
/// let reply = client.sync_text("hello world", DEFAULT_RESPONSE_TIMEOUT)?;
/// assert_eq!(reply.as_text(), Some("hello world"));
///
/// client.close(sync_websocket::DEFAULT_CLOSE_TIMEOUT);
/// ```
pub struct Client<E: ProtocolEngine> {
    conn: Arc<Connection>,
    engine: Arc<Mutex<E>>,
    bus: Arc<EventBus>,
    reader: Option<JoinHandle<()>>,
}

// ============================================================================
// Connect
// ============================================================================

impl<E: ProtocolEngine> Client<E> {
    /// Connects to `url` and blocks until the protocol handshake opens.
    ///
    /// A single deadline of `now + timeout` bounds host resolution, the TCP
    /// connect, the TLS upgrade (for `wss`/`https`) and the protocol
    /// handshake together. On failure no client is returned and all
    /// resources are released.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] for unparseable URLs or unknown schemes
    /// - [`Error::Dns`] / [`Error::Refused`] / [`Error::ConnectTimeout`] /
    ///   [`Error::Tls`] from transport establishment
    /// - [`Error::HandshakeTimeout`] if the `Open` event does not arrive in
    ///   time
    pub fn connect(url: &str, engine: E, options: ConnectOptions, timeout: Duration) -> Result<Self> {
        Self::connect_with(url, engine, options, timeout, |_| {})
    }

    /// Like [`connect`](Self::connect), passing the event bus to `configure`
    /// before the handshake starts.
    ///
    /// Listeners registered there observe the `Open` event and any message
    /// that arrives before `connect` returns.
    pub fn connect_with(
        url: &str,
        engine: E,
        options: ConnectOptions,
        timeout: Duration,
        configure: impl FnOnce(&EventBus),
    ) -> Result<Self> {
        let (host, port, secured) = parse_url(url)?;
        let deadline = Deadline::after(timeout);
        debug!(url, host, port, secured, "connecting");

        let socket = socket::connect(&host, port, &deadline)?;
        // Kept un-wrapped so teardown can abort a read even mid-TLS.
        let cancel = socket.try_clone()?;
        let transport = if secured {
            Transport::Tls(Box::new(socket::upgrade_tls(
                socket, &host, &options, &deadline,
            )?))
        } else {
            Transport::Plain(socket)
        };
        transport.set_read_timeout(Some(READ_POLL_INTERVAL))?;

        let conn = Arc::new(Connection::new(url, host, port, secured, transport, cancel));
        conn.set_state(ConnectionState::Connecting);

        let bus = Arc::new(EventBus::new());
        configure(&bus);

        let mut engine = engine;
        for (name, value) in &options.headers {
            engine.set_header(name, value);
        }
        let engine = Arc::new(Mutex::new(engine));

        // Subscribe before the handshake bytes go out: an engine that opens
        // within the first parsed chunk must not be missed.
        let opened = Waiter::subscribe(&bus, EventKind::Open);

        let mut sink = EngineSink::new();
        engine.lock().start(&mut sink);
        let (output, events) = sink.into_parts();
        conn.write(&bus, &output);
        for event in events {
            conn.apply_engine_event(&bus, event);
        }

        let reader = reader::spawn(Arc::clone(&conn), Arc::clone(&engine), Arc::clone(&bus))?;
        let mut client = Self {
            conn,
            engine,
            bus,
            reader: Some(reader),
        };

        match opened.wait_until(deadline.instant()) {
            Some(_) => {
                debug!(url = client.conn.url(), "connection open");
                Ok(client)
            }
            None => {
                client.teardown();
                Err(Error::handshake_timeout(deadline.total_ms()))
            }
        }
    }
}

// ============================================================================
// Sending
// ============================================================================

impl<E: ProtocolEngine> Client<E> {
    /// Sends a payload, dispatching the frame type by payload kind.
    ///
    /// Text and numbers (stringified) become text frames; byte sequences
    /// become binary frames. Unsupported kinds return `false` with no side
    /// effect.
    pub fn send(&self, payload: impl Into<Payload>) -> bool {
        match payload.into() {
            Payload::Binary(data) => self.send_binary_frame(&data),
            other => match other.to_text() {
                Some(text) => self.send_text_frame(&text),
                None => false,
            },
        }
    }

    /// Sends a text frame. Numbers are stringified; byte sequences are not
    /// text and return `false`.
    pub fn text(&self, payload: impl Into<Payload>) -> bool {
        let payload = payload.into();
        if matches!(payload, Payload::Binary(_)) {
            return false;
        }
        match payload.to_text() {
            Some(text) => self.send_text_frame(&text),
            None => false,
        }
    }

    /// Sends a binary frame. Text and numbers coerce to their byte
    /// representation.
    pub fn binary(&self, payload: impl Into<Payload>) -> bool {
        match payload.into().to_binary() {
            Some(data) => self.send_binary_frame(&data),
            None => false,
        }
    }

    fn send_text_frame(&self, payload: &str) -> bool {
        let mut sink = EngineSink::new();
        self.engine.lock().text(payload, &mut sink);
        self.flush(sink);
        true
    }

    fn send_binary_frame(&self, payload: &[u8]) -> bool {
        let mut sink = EngineSink::new();
        self.engine.lock().binary(payload, &mut sink);
        self.flush(sink);
        true
    }

    /// Drains a sink: wire bytes first, then events, with no locks held.
    fn flush(&self, sink: EngineSink) -> bool {
        if sink.is_empty() {
            return true;
        }
        let (output, events) = sink.into_parts();
        let ok = self.conn.write(&self.bus, &output);
        for event in events {
            self.conn.apply_engine_event(&self.bus, event);
        }
        ok
    }
}

// ============================================================================
// Blocking round trips
// ============================================================================

impl<E: ProtocolEngine> Client<E> {
    /// Sends a text frame and blocks until the next message arrives.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPayload`] if the payload cannot become a text
    ///   frame (nothing is sent, no wait happens)
    /// - [`Error::ResponseTimeout`] if no message arrives within `timeout`
    pub fn sync_text(&self, payload: impl Into<Payload>, timeout: Duration) -> Result<Message> {
        let payload = payload.into();
        if matches!(payload, Payload::Binary(_)) || payload.to_text().is_none() {
            return Err(Error::UnsupportedPayload);
        }
        let reply = Waiter::subscribe(&self.bus, EventKind::Message);
        self.text(payload);
        take_reply(reply.wait(timeout), timeout)
    }

    /// Sends a binary frame and blocks until the next message arrives.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPayload`] if the payload cannot become a binary
    ///   frame (nothing is sent, no wait happens)
    /// - [`Error::ResponseTimeout`] if no message arrives within `timeout`
    pub fn sync_binary(&self, payload: impl Into<Payload>, timeout: Duration) -> Result<Message> {
        let payload = payload.into();
        if payload.to_binary().is_none() {
            return Err(Error::UnsupportedPayload);
        }
        let reply = Waiter::subscribe(&self.bus, EventKind::Message);
        self.binary(payload);
        take_reply(reply.wait(timeout), timeout)
    }
}

fn take_reply(event: Option<Event>, timeout: Duration) -> Result<Message> {
    match event {
        Some(Event::Message(message)) => Ok(message),
        _ => Err(Error::response_timeout(timeout.as_millis() as u64)),
    }
}

// ============================================================================
// Close
// ============================================================================

impl<E: ProtocolEngine> Client<E> {
    /// Closes the connection.
    ///
    /// Initiates the protocol close handshake and waits up to `timeout` for
    /// its confirmation, then tears down unconditionally: the reader's
    /// in-flight read is aborted, the thread joined, and the socket released
    /// before this returns. Exactly one `Close` event is observable whether
    /// or not the confirmation arrived in time.
    ///
    /// Never fails from the caller's perspective. Must not be called from an
    /// event callback — the callback runs on the reader thread, which this
    /// method joins.
    pub fn close(&mut self, timeout: Duration) {
        if self.conn.state() == ConnectionState::Closed {
            // Remote close or broken pipe got here first; finish teardown.
            self.teardown();
            return;
        }

        self.conn.set_state(ConnectionState::Closing);
        if !self.conn.pipe_broken() && !self.conn.remote_closed() {
            let confirmed = Waiter::subscribe(&self.bus, EventKind::Close);
            let mut sink = EngineSink::new();
            self.engine.lock().close(&mut sink);
            self.flush(sink);
            if confirmed.wait(timeout).is_none() {
                debug!(
                    url = self.conn.url(),
                    "close confirmation not received in time"
                );
            }
        }

        self.teardown();
        self.conn.emit_close_once(&self.bus, None);
    }

    fn teardown(&mut self) {
        self.conn.request_stop();
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("reader thread panicked");
            }
        }
        self.conn.release_socket();
    }
}

impl<E: ProtocolEngine> Drop for Client<E> {
    fn drop(&mut self) {
        if self.reader.is_some() {
            trace!(url = self.conn.url(), "client dropped with live reader");
            self.teardown();
        }
    }
}

// ============================================================================
// Accessors & listeners
// ============================================================================

impl<E: ProtocolEngine> Client<E> {
    /// The URL this client connected to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        self.conn.url()
    }

    /// The resolved host portion of the URL.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        self.conn.host()
    }

    /// The connected port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.conn.port()
    }

    /// Whether the transport is TLS-wrapped.
    #[inline]
    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.conn.secured()
    }

    /// Whether the connection is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_open()
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// The event bus carrying `Open`/`Message`/`Error`/`Close`.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Registers a persistent listener. Callbacks run on the reader thread.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> ListenerId {
        self.bus.on(kind, callback)
    }

    /// Registers a one-shot listener. Callbacks run on the reader thread.
    pub fn once(
        &self,
        kind: EventKind,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> ListenerId {
        self.bus.once(kind, callback)
    }

    /// Removes a listener registered with [`on`](Self::on)/[`once`](Self::once).
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.bus.off(kind, id)
    }
}

impl<E: ProtocolEngine> std::fmt::Debug for Client<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.conn.url())
            .field("state", &self.conn.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// URL parsing
// ============================================================================

fn parse_url(raw: &str) -> Result<(String, u16, bool)> {
    let url = Url::parse(raw).map_err(|err| Error::invalid_url(raw, err.to_string()))?;
    let secured = match url.scheme() {
        "wss" | "https" => true,
        "ws" | "http" => false,
        other => {
            return Err(Error::invalid_url(raw, format!("unsupported scheme `{other}`")));
        }
    };
    let host = url
        .host_str()
        .ok_or_else(|| Error::invalid_url(raw, "missing host"))?
        .to_owned();
    let port = url.port().unwrap_or(if secured {
        DEFAULT_SECURE_PORT
    } else {
        DEFAULT_PLAIN_PORT
    });
    Ok((host, port, secured))
}

// ============================================================================
// Tests
// ============================================================================
