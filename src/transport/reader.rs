//! Background read loop.
//!
//! One dedicated `ws-reader` thread per connection pumps raw bytes from the
//! socket into the protocol engine and dispatches whatever the engine
//! decodes. The loop owns no state of its own: it reads through
//! [`Connection::read_chunk`] so the transport lock is released between poll
//! intervals, and it terminates silently on EOF or any read failure —
//! termination is observable only through the events the engine or the
//! client emit.

// ============================================================================
// Imports
// ============================================================================

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::{EngineSink, ProtocolEngine};
use crate::sync::bus::EventBus;
use crate::transport::connection::{Connection, ReadOutcome};

// ============================================================================
// Constants
// ============================================================================

/// Bytes read from the socket per iteration.
pub(crate) const RECV_BUFFER_SIZE: usize = 4096;

/// Receive timeout configured on the socket; bounds how long a read holds
/// the transport lock and how quickly a stop request is noticed.
pub(crate) const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Spawn
// ============================================================================

/// Spawns the reader thread for `conn`.
///
/// The thread runs until the socket closes, a read fails, or
/// [`Connection::request_stop`] aborts it. The caller owns the handle and
/// must join it before releasing the socket.
pub(crate) fn spawn<E: ProtocolEngine>(
    conn: Arc<Connection>,
    engine: Arc<Mutex<E>>,
    bus: Arc<EventBus>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ws-reader".into())
        .spawn(move || read_loop(&conn, &engine, &bus))
}

fn read_loop<E: ProtocolEngine>(conn: &Connection, engine: &Mutex<E>, bus: &EventBus) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        if conn.stop_requested() {
            break;
        }
        let n = match conn.read_chunk(&mut buf) {
            ReadOutcome::Data(n) => n,
            ReadOutcome::Idle => continue,
            ReadOutcome::Closed | ReadOutcome::Failed => break,
        };

        let mut sink = EngineSink::new();
        engine.lock().parse(&buf[..n], &mut sink);
        if sink.is_empty() {
            continue;
        }

        // Engine replies (e.g. close acknowledgments) go out first, then
        // events are dispatched with no locks held.
        let (output, events) = sink.into_parts();
        conn.write(bus, &output);
        for event in events {
            conn.apply_engine_event(bus, event);
        }
    }
    debug!(url = conn.url(), "reader loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
