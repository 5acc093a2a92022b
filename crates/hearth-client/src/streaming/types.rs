//! Types for watch streaming

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Type of a change notification, taken from a frame's leading line.
///
/// Unrecognized types are carried verbatim in [`EventType::Other`] so new
/// server-side event types pass through instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// Data at the path was replaced.
    Put,
    /// Data at the path was partially updated.
    Patch,
    /// Protocol heartbeat, carries no application data.
    KeepAlive,
    /// Server revoked the watch; terminal.
    Cancel,
    /// The credential backing the watch expired; terminal.
    AuthRevoked,
    /// Any other event type, forwarded as-is.
    Other(String),
}

impl EventType {
    pub(crate) fn parse(raw: &str) -> Self {
        match raw {
            "put" => Self::Put,
            "patch" => Self::Patch,
            "keep-alive" => Self::KeepAlive,
            "cancel" => Self::Cancel,
            "auth_revoked" => Self::AuthRevoked,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Put => "put",
            Self::Patch => "patch",
            Self::KeepAlive => "keep-alive",
            Self::Cancel => "cancel",
            Self::AuthRevoked => "auth_revoked",
            Self::Other(other) => other,
        }
    }

    /// Whether the server stops sending events after this type.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancel | Self::AuthRevoked)
    }

    /// Whether the protocol guarantees a JSON payload line for this type.
    pub fn has_payload(&self) -> bool {
        matches!(self, Self::Put | Self::Patch)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification decoded from one stream frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// What kind of change occurred.
    pub event_type: EventType,
    /// Slash-delimited location in the remote tree; empty for control events.
    pub path: String,
    /// Changed value; `None` for control events, may be JSON null for deletes.
    pub data: Option<Value>,
}

impl Event {
    /// A payload-free event, used for control and unrecognized types.
    pub(crate) fn bare(event_type: EventType) -> Self {
        Self {
            event_type,
            path: String::new(),
            data: None,
        }
    }
}

/// Embedded JSON payload of a `put`/`patch` frame.
#[derive(Debug, Deserialize)]
pub(crate) struct ChangePayload {
    pub path: String,
    #[serde(default)]
    pub data: Value,
}

/// Errors reported by the watch read loop.
///
/// These never reach the consumer channel directly; they are logged and the
/// loop either skips the frame or closes the watch.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Frame or payload could not be decoded.
    #[error("malformed frame: {0}")]
    Frame(String),

    /// An unterminated frame outgrew the buffer ceiling.
    #[error("frame exceeded {limit} bytes without a blank-line terminator")]
    Overflow { limit: usize },
}
