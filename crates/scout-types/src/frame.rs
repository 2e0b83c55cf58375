//! WebSocket frame protocol between the client and the chat backend.
//!
//! Every frame is a single JSON object carrying a `type` discriminator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent from the backend to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Backend assigned (or reassigned) the conversation context. A null or
    /// missing identifier means the backend dropped it.
    SessionId {
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Assistant reply. Usually a string, which may itself hold JSON-encoded
    /// results; structured values are accepted as-is.
    Response {
        #[serde(default)]
        content: Value,
    },
    /// Backend-reported failure for the last query.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Backend started working on a query. Advisory only.
    Thinking,
    /// Any `type` this client does not understand.
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Wire name of the frame type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::SessionId { .. } => "session_id",
            InboundFrame::Response { .. } => "response",
            InboundFrame::Error { .. } => "error",
            InboundFrame::Thinking => "thinking",
            InboundFrame::Unknown => "unknown",
        }
    }
}

/// Frames sent from the client to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Ask the backend a question within the current session.
    Query {
        query: String,
        session_id: Option<String>,
    },
    /// Drop the backend's conversation history for the session.
    Clear { session_id: Option<String> },
}
