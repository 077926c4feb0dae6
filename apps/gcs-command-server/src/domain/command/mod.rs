//! Outbound Commands
//!
//! The message the station sends back for each telemetry report.

use crate::domain::advisory::Advisory;

/// Identifier the station uses as sender on every command.
pub const RESPONDER_ID: &str = "GCS";

/// Type tag carried by every command.
pub const COMMAND_TYPE: &str = "COMMAND";

/// A command addressed back to the reporting unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Sender identifier, always [`RESPONDER_ID`].
    pub unit_id: String,
    /// Type tag, always [`COMMAND_TYPE`].
    pub kind: String,
    /// Rendered advisory text.
    pub payload: String,
    /// Send time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl Command {
    /// Wrap `advisory` in a command stamped with `timestamp_ms`.
    #[must_use]
    pub fn from_advisory(advisory: &Advisory, timestamp_ms: i64) -> Self {
        Self {
            unit_id: RESPONDER_ID.to_string(),
            kind: COMMAND_TYPE.to_string(),
            payload: advisory.to_string(),
            timestamp_ms,
        }
    }
}
