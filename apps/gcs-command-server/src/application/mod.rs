//! Application Layer - Use cases and port definitions.
//!
//! Orchestrates the domain core for one inbound report and defines the
//! ports the infrastructure layer implements.

/// Port interfaces for external systems (clock).
pub mod ports;

/// Application services for turning telemetry into commands.
pub mod services;
