//! Core session client for Scout: connection lifecycle, timeline, and
//! content classification.

mod classifier;
mod client;
mod controller;
mod error;
mod runtime;
#[cfg(test)]
mod testing;
mod timeline;

pub use classifier::{classify, classify_item};
pub use client::{ClientEvent, SessionClient, SessionConfig, SessionSnapshot};
pub use controller::{
    Channel, ChannelToken, ConnectionController, ControllerEvent, Timer, TimerHandle, TimerToken,
    Transport, TransportEvent, DEFAULT_RECONNECT_DELAY,
};
pub use error::ScoutError;
pub use runtime::SessionHandle;
pub use timeline::{Timeline, GENERIC_ERROR_MESSAGE};

/// Result type for Scout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;
