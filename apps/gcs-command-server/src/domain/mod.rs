//! Domain Layer - Telemetry evaluation core.
//!
//! Pure, stateless types and functions: payload field extraction, the
//! advisory rule table and the outbound command shape. Nothing here
//! performs I/O or logging.

/// Payload field extraction (battery, altitude, speed).
pub mod telemetry;

/// Ordered advisory rule table.
pub mod advisory;

/// Outbound command messages.
pub mod command;
