//! Error types for Scout.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend unavailable")]
    Unavailable,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Session task has shut down")]
    SessionClosed,
}

impl ScoutError {
    /// Classify a connect failure. Refused or reset connections mean the
    /// backend is simply not there yet.
    pub fn from_tungstenite(err: tungstenite::Error) -> Self {
        let unavailable = match &err {
            tungstenite::Error::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        };
        if unavailable {
            Self::Unavailable
        } else {
            Self::WebSocket(err)
        }
    }
}
