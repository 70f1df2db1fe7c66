//! Outbound WebSocket event envelope.
//!
//! Exactly two event kinds exist: a worker is told about a newly created
//! request, and a requester is told about a status change. Wire names are
//! camelCase for compatibility with existing clients.

use serde::Serialize;

/// The two request lifecycle events pushed over WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Sent to the target worker when a request is created.
    NewRequest,
    /// Sent to the requester when a request's status changes.
    StatusUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewRequest => "newRequest",
            Self::StatusUpdate => "requestStatusUpdate",
        }
    }
}

/// JSON frame written to the socket: `{"event": "...", "payload": {...}}`
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub event: &'static str,
    pub payload: serde_json::Value,
}
