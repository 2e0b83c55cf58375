//! Shared types for the Scout session client.

mod connection;
mod content;
mod entry;
mod frame;

pub use connection::*;
pub use content::*;
pub use entry::*;
pub use frame::*;
