//! Shared fixtures for integration tests.
//!
//! Provides an in-process echo peer plus [`LineEngine`], a deliberately
//! simple line-oriented protocol engine: the handshake is one greeting line
//! echoed back, text frames travel as `T:<payload>` lines, binary frames as
//! `B:<payload>` lines, and the close handshake as a `C:` line. Against an
//! echoing peer this exercises the full client machinery — handshake open,
//! round trips, close confirmation — without a real WebSocket server.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use sync_websocket::{EngineSink, Event, Message, ProtocolEngine};

/// Greeting line that opens the connection once echoed back.
const GREETING: &[u8] = b"HELLO";

// ============================================================================
// Test servers
// ============================================================================

/// Spawns a TCP server that echoes every byte back to the sender.
pub fn echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind echo server");
    let addr = listener.local_addr().expect("echo server addr");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            thread::spawn(move || echo_connection(stream));
        }
    });

    addr
}

fn echo_connection(mut stream: TcpStream) {
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if stream.write_all(&buf[..n]).is_err() {
                    break;
                }
            }
        }
    }
}

/// Spawns a TCP server that accepts connections, consumes input, and never
/// replies. The protocol handshake can therefore never complete.
pub fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent server");
    let addr = listener.local_addr().expect("silent server addr");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
            });
        }
    });

    addr
}

/// Returns a port with nothing listening on it.
pub fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

// ============================================================================
// LineEngine
// ============================================================================

/// Line-oriented protocol engine for driving the client against an echo peer.
pub struct LineEngine {
    buffer: Vec<u8>,
    greeted: bool,
    headers: Arc<Mutex<Vec<(String, String)>>>,
}

impl LineEngine {
    pub fn new() -> Self {
        Self::with_header_log(Arc::new(Mutex::new(Vec::new())))
    }

    /// Records `set_header` calls into `log` so tests can observe them after
    /// the engine has been moved into the client.
    pub fn with_header_log(log: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        Self {
            buffer: Vec::new(),
            greeted: false,
            headers: log,
        }
    }

    fn dispatch_line(&mut self, line: &[u8], sink: &mut EngineSink) {
        if !self.greeted {
            if line == GREETING {
                self.greeted = true;
                sink.emit(Event::Open);
            } else {
                sink.emit(Event::Error(format!(
                    "unexpected greeting: {}",
                    String::from_utf8_lossy(line)
                )));
            }
            return;
        }

        if let Some(rest) = line.strip_prefix(b"T:") {
            sink.emit(Event::Message(Message::Text(
                String::from_utf8_lossy(rest).into_owned(),
            )));
        } else if let Some(rest) = line.strip_prefix(b"B:") {
            sink.emit(Event::Message(Message::Binary(rest.to_vec())));
        } else if line.starts_with(b"C:") {
            sink.emit(Event::Close(None));
        } else {
            sink.emit(Event::Error(format!(
                "unparseable line: {}",
                String::from_utf8_lossy(line)
            )));
        }
    }
}

impl ProtocolEngine for LineEngine {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .lock()
            .expect("header log")
            .push((name.to_owned(), value.to_owned()));
    }

    fn start(&mut self, sink: &mut EngineSink) {
        sink.write(GREETING);
        sink.write(b"\n");
    }

    fn parse(&mut self, data: &[u8], sink: &mut EngineSink) {
        self.buffer.extend_from_slice(data);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.dispatch_line(&line[..line.len() - 1], sink);
        }
    }

    fn text(&mut self, payload: &str, sink: &mut EngineSink) {
        sink.write(format!("T:{payload}\n"));
    }

    fn binary(&mut self, payload: &[u8], sink: &mut EngineSink) {
        sink.write(b"B:");
        sink.write(payload);
        sink.write(b"\n");
    }

    fn close(&mut self, sink: &mut EngineSink) {
        sink.write(b"C:\n");
    }
}
