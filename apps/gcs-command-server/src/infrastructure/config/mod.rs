//! Configuration Module
//!
//! Configuration loading for the command server.

mod settings;

pub use settings::{ConfigError, ServerConfig, StreamSettings};
