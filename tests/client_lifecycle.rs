//! End-to-end tests for the blocking client lifecycle.
//!
//! These drive a real client — reader thread, event bus, park/wake bridge —
//! against in-process TCP peers using the line-protocol engine from
//! `common`. They verify the blocking semantics the crate exists for:
//! connect returns when the handshake opens (not after a fixed delay),
//! round trips deliver the matching reply, and close leaves no thread or
//! socket behind.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use common::{LineEngine, echo_server, refused_port, silent_server};
use sync_websocket::{
    Client, ConnectOptions, ConnectionState, Error, EventKind, Message, Waiter,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

fn connect_echo() -> Client<LineEngine> {
    let addr = echo_server();
    Client::connect(
        &format!("ws://{addr}"),
        LineEngine::new(),
        ConnectOptions::new(),
        CONNECT_TIMEOUT,
    )
    .expect("connect to echo peer")
}

// ============================================================================
// Connection
// ============================================================================

#[test]
fn test_connect_opens_without_burning_the_timeout() {
    let started = Instant::now();
    let mut client = connect_echo();

    // Woken by the open event, not by the deadline.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(client.is_open());
    assert_eq!(client.state(), ConnectionState::Open);
    assert!(!client.is_secured());
    assert_eq!(client.host(), "127.0.0.1");

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_connect_refused_fails_fast() {
    let port = refused_port();

    let started = Instant::now();
    let result = Client::connect(
        &format!("ws://127.0.0.1:{port}"),
        LineEngine::new(),
        ConnectOptions::new(),
        CONNECT_TIMEOUT,
    );

    let err = result.err().expect("connect must fail");
    assert!(err.is_connection_error());
    assert!(matches!(err, Error::Refused { .. }));
    assert!(started.elapsed() < CONNECT_TIMEOUT + Duration::from_secs(2));
}

#[test]
fn test_connect_unresolvable_host_is_dns_failure() {
    let result = Client::connect(
        "ws://definitely-not-a-real-host.invalid",
        LineEngine::new(),
        ConnectOptions::new(),
        CONNECT_TIMEOUT,
    );

    let err = result.err().expect("connect must fail");
    assert!(matches!(err, Error::Dns { .. }));
}

#[test]
fn test_handshake_timeout_against_silent_peer() {
    let addr = silent_server();
    let timeout = Duration::from_millis(500);

    let started = Instant::now();
    let result = Client::connect(
        &format!("ws://{addr}"),
        LineEngine::new(),
        ConnectOptions::new(),
        timeout,
    );

    let err = result.err().expect("handshake must time out");
    assert!(matches!(err, Error::HandshakeTimeout { .. }));
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_connect_forwards_headers_to_engine() {
    let addr = echo_server();
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut client = Client::connect(
        &format!("ws://{addr}"),
        LineEngine::with_header_log(Arc::clone(&log)),
        ConnectOptions::new()
            .with_header("Authorization", "Basic XXX")
            .with_header("Accept", "application/json"),
        CONNECT_TIMEOUT,
    )
    .expect("connect with headers");

    {
        let seen = log.lock().expect("header log");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("Authorization".into(), "Basic XXX".into()));
    }

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_connect_with_observes_open_event() {
    let addr = echo_server();
    let opens = Arc::new(AtomicUsize::new(0));

    let opens_clone = Arc::clone(&opens);
    let mut client = Client::connect_with(
        &format!("ws://{addr}"),
        LineEngine::new(),
        ConnectOptions::new(),
        CONNECT_TIMEOUT,
        move |bus| {
            bus.on(EventKind::Open, move |_| {
                opens_clone.fetch_add(1, Ordering::SeqCst);
            });
        },
    )
    .expect("connect");

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    client.close(CLOSE_TIMEOUT);
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_sync_text_round_trip() {
    let mut client = connect_echo();

    let reply = client
        .sync_text("hello world", RESPONSE_TIMEOUT)
        .expect("reply");
    assert_eq!(reply, Message::Text("hello world".into()));

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_sync_text_stringifies_numbers() {
    let mut client = connect_echo();

    let reply = client.sync_text(100, RESPONSE_TIMEOUT).expect("reply");
    assert_eq!(reply.as_text(), Some("100"));

    let reply = client.sync_text("again", RESPONSE_TIMEOUT).expect("reply");
    assert_eq!(reply.as_text(), Some("again"));

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_sync_binary_round_trip() {
    let mut client = connect_echo();

    let reply = client.sync_binary(100, RESPONSE_TIMEOUT).expect("reply");
    assert_eq!(reply, Message::Binary(b"100".to_vec()));

    let reply = client.sync_binary("again", RESPONSE_TIMEOUT).expect("reply");
    assert_eq!(reply, Message::Binary(b"again".to_vec()));

    let payload = vec![72u8, 101, 108, 108, 111, 44, 32, 119, 111, 114, 108, 100];
    let reply = client
        .sync_binary(payload.clone(), RESPONSE_TIMEOUT)
        .expect("reply");
    assert_eq!(reply, Message::Binary(payload));

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_rapid_sync_calls_receive_their_own_replies() {
    let mut client = connect_echo();

    let first = client.sync_text("first", RESPONSE_TIMEOUT).expect("reply");
    let second = client.sync_text("second", RESPONSE_TIMEOUT).expect("reply");

    assert_eq!(first.as_text(), Some("first"));
    assert_eq!(second.as_text(), Some("second"));

    client.close(CLOSE_TIMEOUT);
}

#[test]
fn test_async_send_with_listener() {
    let mut client = connect_echo();

    let reply = Waiter::subscribe(client.bus(), EventKind::Message);
    assert!(client.text("hello world"));

    match reply.wait(RESPONSE_TIMEOUT) {
        Some(sync_websocket::Event::Message(msg)) => {
            assert_eq!(msg.as_text(), Some("hello world"));
        }
        other => panic!("expected message event, got {other:?}"),
    }

    client.close(CLOSE_TIMEOUT);
}

// ============================================================================
// Unsupported payloads
// ============================================================================

#[test]
fn test_unsupported_send_produces_no_message() {
    let mut client = connect_echo();

    let stray = Waiter::subscribe(client.bus(), EventKind::Message);
    assert!(!client.send(None::<String>));

    // Grace period: nothing was framed, so nothing can echo back.
    assert_eq!(stray.wait(Duration::from_millis(300)), None);

    client.close(CLOSE_TIMEOUT);
}

// ============================================================================
// Close
// ============================================================================

#[test]
fn test_close_confirms_and_stops_the_reader() {
    let mut client = connect_echo();

    let closes = Arc::new(AtomicUsize::new(0));
    let closes_clone = Arc::clone(&closes);
    client.on(EventKind::Close, move |_| {
        closes_clone.fetch_add(1, Ordering::SeqCst);
    });

    let started = Instant::now();
    client.close(CLOSE_TIMEOUT);

    // The echo peer acknowledges immediately; the wait must not burn the
    // full close timeout.
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!client.is_open());
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_close_twice_emits_one_event() {
    let mut client = connect_echo();

    let closes = Arc::new(AtomicUsize::new(0));
    let closes_clone = Arc::clone(&closes);
    client.on(EventKind::Close, move |_| {
        closes_clone.fetch_add(1, Ordering::SeqCst);
    });

    client.close(CLOSE_TIMEOUT);
    client.close(CLOSE_TIMEOUT);

    assert!(!client.is_open());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_no_delivery_after_close() {
    let mut client = connect_echo();

    client.close(CLOSE_TIMEOUT);

    let stray = Waiter::subscribe(client.bus(), EventKind::Message);
    // The socket is gone and the reader joined; a send can produce nothing.
    client.text("into the void");
    assert_eq!(stray.wait(Duration::from_millis(300)), None);
}
