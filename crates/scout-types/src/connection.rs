//! Connection lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the backend connection.
///
/// `Closed` is never terminal: unless the client is shutting down, it is
/// always followed by a scheduled return to `Connecting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection attempt yet, or permanently shut down.
    #[default]
    Idle,
    /// Channel is being opened.
    Connecting,
    /// Channel is open; frames may be sent.
    Open,
    /// Channel failed or was closed; a reconnect is pending.
    Closed,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// True while a channel is being opened or is already open.
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}
