//! Application Services
//!
//! - `CommandService`: turns one telemetry report into one command

use crate::application::ports::Clock;
use crate::domain::advisory::Advisory;
use crate::domain::command::Command;
use crate::domain::telemetry::{ExtractedMetrics, FieldReading, TelemetryField, read_field};

/// Everything learned from one telemetry payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Per-field lookup outcome, in [`TelemetryField::ALL`] order.
    pub readings: [(TelemetryField, FieldReading); 3],
    /// Values fed to the rule table.
    pub metrics: ExtractedMetrics,
    /// The advisory selected by the rule table.
    pub advisory: Advisory,
}

/// The outcome of handling one inbound report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// How the payload was read and judged.
    pub assessment: Assessment,
    /// The command to send back.
    pub command: Command,
}

/// Stateless telemetry-to-command service.
///
/// Holds nothing but its clock, so one instance is shared by every stream.
#[derive(Debug, Clone, Default)]
pub struct CommandService<C> {
    clock: C,
}

impl<C: Clock> CommandService<C> {
    /// Create a service stamping commands with `clock`.
    #[must_use]
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Extract fields from `payload` and evaluate the rule table.
    ///
    /// Malformed fields are logged and treated as absent.
    #[must_use]
    pub fn assess(&self, payload: &str) -> Assessment {
        let readings = TelemetryField::ALL.map(|field| (field, read_field(payload, field)));

        for (field, reading) in &readings {
            match reading {
                FieldReading::Malformed { raw, reason } => {
                    tracing::warn!(
                        field = field.as_str(),
                        pattern = field.pattern().as_str(),
                        raw = %raw,
                        reason = %reason,
                        "Telemetry field parsing failed"
                    );
                }
                FieldReading::Missing => {
                    tracing::debug!(field = field.as_str(), "Telemetry field not present");
                }
                FieldReading::Present(_) => {}
            }
        }

        let metrics = ExtractedMetrics::from_readings(&readings);
        let advisory = Advisory::evaluate(&metrics);

        Assessment {
            readings,
            metrics,
            advisory,
        }
    }

    /// Handle one report from `unit_id`.
    #[must_use]
    pub fn respond(&self, unit_id: &str, payload: &str) -> Reply {
        tracing::info!(unit_id = %unit_id, payload = %payload, "Received telemetry");

        let assessment = self.assess(payload);
        let command = Command::from_advisory(&assessment.advisory, self.clock.now_millis());

        tracing::debug!(
            unit_id = %unit_id,
            advisory = assessment.advisory.kind(),
            "Command issued"
        );

        Reply {
            assessment,
            command,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
