//! Advisory Rules
//!
//! Maps extracted telemetry to exactly one advisory using a fixed, ordered
//! rule table. The first matching rule wins:
//!
//! | # | Condition                             | Advisory          |
//! |---|---------------------------------------|-------------------|
//! | 1 | `0 < battery < 25`                    | battery critical  |
//! | 2 | `altitude > 5000`                     | altitude too high |
//! | 3 | `speed > 250`                         | speed too high    |
//! | 4 | `battery >= 90 && altitude < 1000`    | systems optimal   |
//! | 5 | otherwise                             | acknowledged      |
//!
//! Absent fields compare as [`ABSENT`](crate::domain::telemetry::ABSENT)
//! (`-1`). They never satisfy rules 1-3, and an absent altitude satisfies
//! `altitude < 1000` in rule 4.

use std::fmt;

use crate::domain::telemetry::{ExtractedMetrics, TelemetryField};

/// Battery percentage below which the unit must return to base.
pub const BATTERY_CRITICAL_BELOW: i32 = 25;

/// Altitude ceiling in meters.
pub const ALTITUDE_CEILING_M: i32 = 5000;

/// Altitude a unit above the ceiling is told to descend to.
pub const DESCENT_TARGET_M: i32 = 4500;

/// Speed limit in km/h.
pub const SPEED_LIMIT_KMH: i32 = 250;

/// Speed a unit above the limit is told to reduce to.
pub const CRUISE_SPEED_KMH: i32 = 200;

/// Battery percentage at or above which a low unit may climb.
pub const OPTIMAL_BATTERY_MIN: i32 = 90;

/// Altitude below which a fully charged unit is told to climb.
pub const LOW_ALTITUDE_BELOW_M: i32 = 1000;

/// Altitude a fully charged low unit is told to climb to.
pub const MISSION_ALTITUDE_M: i32 = 1500;

/// The single advisory issued for one telemetry report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Advisory {
    /// Battery is critically low.
    BatteryCritical {
        /// Reported battery percentage.
        battery: i32,
    },
    /// Unit is above the altitude ceiling.
    AltitudeTooHigh {
        /// Reported altitude in meters.
        altitude: i32,
    },
    /// Unit is above the speed limit.
    SpeedTooHigh {
        /// Reported speed in km/h.
        speed: i32,
    },
    /// Fully charged and low; climb to mission altitude.
    SystemsOptimal,
    /// No rule matched.
    Acknowledged,
}

impl Advisory {
    /// Evaluate the rule table against `metrics`.
    #[must_use]
    pub fn evaluate(metrics: &ExtractedMetrics) -> Self {
        let battery = metrics.encoded(TelemetryField::Battery);
        let altitude = metrics.encoded(TelemetryField::Altitude);
        let speed = metrics.encoded(TelemetryField::Speed);

        if battery > 0 && battery < BATTERY_CRITICAL_BELOW {
            Self::BatteryCritical { battery }
        } else if altitude > ALTITUDE_CEILING_M {
            Self::AltitudeTooHigh { altitude }
        } else if speed > SPEED_LIMIT_KMH {
            Self::SpeedTooHigh { speed }
        } else if battery >= OPTIMAL_BATTERY_MIN && altitude < LOW_ALTITUDE_BELOW_M {
            Self::SystemsOptimal
        } else {
            Self::Acknowledged
        }
    }

    /// Stable snake_case label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BatteryCritical { .. } => "battery_critical",
            Self::AltitudeTooHigh { .. } => "altitude_too_high",
            Self::SpeedTooHigh { .. } => "speed_too_high",
            Self::SystemsOptimal => "systems_optimal",
            Self::Acknowledged => "acknowledged",
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatteryCritical { battery } => {
                write!(
                    f,
                    "Battery critical ({battery}%). Return to base immediately."
                )
            }
            Self::AltitudeTooHigh { altitude } => {
                write!(
                    f,
                    "Altitude too high ({altitude}m). Descend to {DESCENT_TARGET_M}m."
                )
            }
            Self::SpeedTooHigh { speed } => {
                write!(
                    f,
                    "Speed too high ({speed}km/h). Reduce to {CRUISE_SPEED_KMH}km/h."
                )
            }
            Self::SystemsOptimal => write!(
                f,
                "All systems optimal. Ascend to mission altitude ({MISSION_ALTITUDE_M}m)."
            ),
            Self::Acknowledged => {
                f.write_str("Telemetry acknowledged. Maintain current trajectory.")
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
