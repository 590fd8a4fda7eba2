//! Shared connection state and the write path.
//!
//! [`Connection`] is the single piece of state shared between the caller
//! thread and the reader thread: the transport handle, a pre-TLS socket
//! clone used to cancel a blocking read, the connection state cell, and the
//! latches that keep teardown idempotent. The transport and each flag have
//! their own synchronization; no path holds two locks at once.

// ============================================================================
// Imports
// ============================================================================

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::protocol::Event;
use crate::sync::bus::EventBus;
use crate::transport::socket::Transport;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a connection.
///
/// Transitions move strictly forward: `Init → Connecting → Open → Closing →
/// Closed`, with `Connecting → Closed` on connect failure and
/// `Open → Closed` on remote close or broken pipe. `Connecting` is never
/// re-entered; a closed client is constructed anew to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Constructed, no connect attempt yet.
    Init = 0,
    /// Transport establishment and protocol handshake in progress.
    Connecting = 1,
    /// Handshake complete; frames flow.
    Open = 2,
    /// Close handshake in progress.
    Closing = 3,
    /// Torn down; the client is not reusable.
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Init,
            1 => Self::Connecting,
            2 => Self::Open,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Atomic cell holding a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

// ============================================================================
// Outcome of one read attempt
// ============================================================================

/// Result of a single bounded read from the transport.
pub(crate) enum ReadOutcome {
    /// Bytes arrived.
    Data(usize),
    /// The poll interval elapsed with nothing to read.
    Idle,
    /// The peer closed the stream, or the socket was already released.
    Closed,
    /// An unrecoverable read error.
    Failed,
}

// ============================================================================
// Connection
// ============================================================================

/// State shared between the caller thread and the reader thread.
///
/// The socket is exclusively owned here from `connect()` until teardown
/// releases it. Writes come from the caller thread (outgoing frames) and
/// from the reader thread (engine replies such as close acknowledgments);
/// both funnel through [`write`](Self::write).
pub(crate) struct Connection {
    url: String,
    host: String,
    port: u16,
    secured: bool,
    transport: Mutex<Option<Transport>>,
    /// Pre-TLS clone of the raw socket; shutting it down aborts an
    /// in-flight blocking read on the reader thread.
    cancel: Mutex<Option<TcpStream>>,
    state: AtomicConnectionState,
    stop: AtomicBool,
    pipe_broken: AtomicBool,
    remote_closed: AtomicBool,
    close_emitted: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        url: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        secured: bool,
        transport: Transport,
        cancel: TcpStream,
    ) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
            port,
            secured,
            transport: Mutex::new(Some(transport)),
            cancel: Mutex::new(Some(cancel)),
            state: AtomicConnectionState::new(ConnectionState::Init),
            stop: AtomicBool::new(false),
            pipe_broken: AtomicBool::new(false),
            remote_closed: AtomicBool::new(false),
            close_emitted: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn secured(&self) -> bool {
        self.secured
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.set(state);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state.get() == ConnectionState::Open
    }

    pub(crate) fn pipe_broken(&self) -> bool {
        self.pipe_broken.load(Ordering::Acquire)
    }

    pub(crate) fn remote_closed(&self) -> bool {
        self.remote_closed.load(Ordering::Acquire)
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    // ========================================================================
    // Data path
    // ========================================================================

    /// Writes engine output to the socket.
    ///
    /// Never propagates an error. A broken pipe marks the connection broken
    /// and surfaces through a single `Close` event; other write failures are
    /// logged and reported to the engine driver as `false`.
    pub(crate) fn write(&self, bus: &EventBus, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return true;
        }
        let mut guard = self.transport.lock();
        let Some(transport) = guard.as_mut() else {
            trace!("write after socket release dropped");
            return false;
        };
        match transport.write_all(bytes).and_then(|()| transport.flush()) {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                drop(guard);
                self.pipe_broken.store(true, Ordering::Release);
                self.state.set(ConnectionState::Closed);
                warn!(error = %err, "write to half-closed socket");
                self.emit_close_once(bus, Some(err.to_string()));
                false
            }
            Err(err) => {
                warn!(error = %err, "socket write failed");
                false
            }
        }
    }

    /// Performs one bounded read into `buf`.
    ///
    /// The transport lock is held only for the duration of the read, which
    /// the configured receive timeout keeps to one poll interval.
    pub(crate) fn read_chunk(&self, buf: &mut [u8]) -> ReadOutcome {
        let mut guard = self.transport.lock();
        let Some(transport) = guard.as_mut() else {
            return ReadOutcome::Closed;
        };
        match transport.read(buf) {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => ReadOutcome::Data(n),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                ReadOutcome::Idle
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => ReadOutcome::Idle,
            Err(err) => {
                debug!(error = %err, "socket read failed");
                ReadOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Event application
    // ========================================================================

    /// Applies a decoded engine event to the connection state and forwards
    /// it to subscribers.
    ///
    /// Called with no locks held; listeners run on the calling thread.
    pub(crate) fn apply_engine_event(&self, bus: &EventBus, event: Event) {
        match event {
            Event::Open => {
                self.state.set(ConnectionState::Open);
                bus.emit(&Event::Open);
            }
            Event::Close(reason) => {
                self.remote_closed.store(true, Ordering::Release);
                if self.state.get() != ConnectionState::Closing {
                    self.state.set(ConnectionState::Closed);
                }
                self.emit_close_once(bus, reason);
            }
            other => bus.emit(&other),
        }
    }

    /// Emits the `Close` event exactly once over the connection's lifetime.
    ///
    /// The close acknowledgment, a remote close, a broken pipe, and the
    /// unconditional teardown in `close()` all race to this latch.
    pub(crate) fn emit_close_once(&self, bus: &EventBus, error: Option<String>) {
        if self.close_emitted.swap(true, Ordering::AcqRel) {
            return;
        }
        bus.emit(&Event::Close(error));
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Requests the reader loop to stop and aborts its in-flight read by
    /// shutting down the raw socket.
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(cancel) = self.cancel.lock().as_ref() {
            let _ = cancel.shutdown(Shutdown::Both);
        }
    }

    /// Drops the socket handles and marks the connection closed.
    ///
    /// Callers join the reader thread first; a read must never race a
    /// released socket.
    pub(crate) fn release_socket(&self) {
        *self.transport.lock() = None;
        *self.cancel.lock() = None;
        self.state.set(ConnectionState::Closed);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
