//! Scout terminal client library.
//!
//! Configuration, logging and rendering live here, separate from main.rs,
//! so they can be tested.

pub mod config;
pub mod logging;
pub mod render;
