//! Received message and outgoing payload types.
//!
//! [`Message`] is what the peer sent — a decoded text or binary frame.
//! [`Payload`] is what the caller hands to `send`/`text`/`binary`; its kind
//! decides the frame type. Numbers are stringified into text frames, byte
//! sequences become binary frames, and [`Payload::Empty`] never produces a
//! frame at all — the send call reports `false` instead.

// ============================================================================
// Message
// ============================================================================

/// A complete frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Vec<u8>),
}

impl Message {
    /// Returns the text content, if this is a text frame.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the raw bytes of either frame kind.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Consumes the message, returning its bytes.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(data) => data,
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// A caller-supplied payload for `send`/`text`/`binary`.
///
/// The accepted kinds mirror the classic dynamic dispatch of synchronous
/// WebSocket clients: text, numbers (stringified), byte sequences, and an
/// explicit absent value that is never framed.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// UTF-8 text.
    Text(String),
    /// A number, rendered with `Display` when framed.
    Number(f64),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Absent value; send calls return `false` without side effects.
    Empty,
}

impl Payload {
    /// Renders the payload as text-frame content.
    ///
    /// Returns `None` for kinds that cannot become a text frame.
    #[inline]
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Binary(_) | Self::Empty => None,
        }
    }

    /// Renders the payload as binary-frame content.
    ///
    /// Text and numbers coerce to their byte representation.
    #[inline]
    #[must_use]
    pub fn to_binary(&self) -> Option<Vec<u8>> {
        match self {
            Self::Binary(data) => Some(data.clone()),
            Self::Text(text) => Some(text.clone().into_bytes()),
            Self::Number(n) => Some(n.to_string().into_bytes()),
            Self::Empty => None,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Payload {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Self::Binary(data.to_vec())
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Self::Empty,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
