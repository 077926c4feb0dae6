//! Telemetry Field Extraction
//!
//! Field units report telemetry as free text, for example
//! `"Battery: 80%, Altitude: 1200m, Speed: 180km/h"`. This module scans a
//! payload for the three fields the advisory rules need.
//!
//! # Design
//!
//! Each field is looked up independently with its own pattern, so a
//! malformed altitude never prevents battery extraction. Lookups never fail:
//! a missing or unparseable field is reported as absent.
//!
//! A field matches `<Label>:`, optional whitespace, a run of ASCII digits and
//! the field's unit token. Negative values carry a `-` and therefore never
//! match, which makes negative telemetry indistinguishable from missing
//! telemetry.

use std::sync::OnceLock;

use regex::Regex;

// =============================================================================
// Constants
// =============================================================================

/// Numeric encoding of an absent field, used when rules compare values.
pub const ABSENT: i32 = -1;

// =============================================================================
// Fields
// =============================================================================

/// A numeric field embedded in a telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    /// Remaining battery charge, in percent.
    Battery,
    /// Altitude above ground, in meters.
    Altitude,
    /// Ground speed, in kilometers per hour.
    Speed,
}

impl TelemetryField {
    /// All fields, in extraction order.
    pub const ALL: [Self; 3] = [Self::Battery, Self::Altitude, Self::Speed];

    /// Label preceding the value in the payload.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Battery => "Battery",
            Self::Altitude => "Altitude",
            Self::Speed => "Speed",
        }
    }

    /// Unit token immediately following the value.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Battery => "%",
            Self::Altitude => "m",
            Self::Speed => "km/h",
        }
    }

    /// Lowercase name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Altitude => "altitude",
            Self::Speed => "speed",
        }
    }

    /// The compiled lookup pattern for this field.
    #[must_use]
    pub fn pattern(self) -> &'static Regex {
        static BATTERY: OnceLock<Regex> = OnceLock::new();
        static ALTITUDE: OnceLock<Regex> = OnceLock::new();
        static SPEED: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            Self::Battery => &BATTERY,
            Self::Altitude => &ALTITUDE,
            Self::Speed => &SPEED,
        };
        cell.get_or_init(|| compile_pattern(self))
    }
}

/// Build the pattern `<Label>:[ \t\n\x0B\f\r]*([0-9]+)<unit>`.
///
/// Whitespace and digits are ASCII only.
#[allow(clippy::expect_used)]
fn compile_pattern(field: TelemetryField) -> Regex {
    let source = format!(
        r"{}:[ \t\n\x0B\f\r]*([0-9]+){}",
        regex::escape(field.label()),
        regex::escape(field.unit())
    );
    // Labels and units are static ASCII tokens, so the pattern is always valid
    Regex::new(&source).expect("telemetry field pattern is valid")
}

// =============================================================================
// Field Readings
// =============================================================================

/// Outcome of looking up one field in a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReading {
    /// The field was found and parsed.
    Present(i32),
    /// The pattern did not match anywhere in the payload.
    Missing,
    /// The pattern matched but the digits are not a representable integer.
    Malformed {
        /// The captured digit run.
        raw: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl FieldReading {
    /// The parsed value, or `None` when missing or malformed.
    #[must_use]
    pub const fn value(&self) -> Option<i32> {
        match self {
            Self::Present(value) => Some(*value),
            Self::Missing | Self::Malformed { .. } => None,
        }
    }
}

/// Look up `field` in `payload`, keeping the reason for any absence.
///
/// Only the first match is considered.
#[must_use]
pub fn read_field(payload: &str, field: TelemetryField) -> FieldReading {
    let Some(digits) = field
        .pattern()
        .captures(payload)
        .and_then(|caps| caps.get(1))
    else {
        return FieldReading::Missing;
    };

    match digits.as_str().parse::<i32>() {
        Ok(value) => FieldReading::Present(value),
        Err(e) => FieldReading::Malformed {
            raw: digits.as_str().to_string(),
            reason: e.to_string(),
        },
    }
}

/// Look up `field` in `payload`.
///
/// Returns `None` when the field is missing or unparseable.
#[must_use]
pub fn extract(payload: &str, field: TelemetryField) -> Option<i32> {
    read_field(payload, field).value()
}

// =============================================================================
// Extracted Metrics
// =============================================================================

/// The three fields the advisory rules evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractedMetrics {
    /// Battery percentage.
    pub battery: Option<i32>,
    /// Altitude in meters.
    pub altitude: Option<i32>,
    /// Speed in km/h.
    pub speed: Option<i32>,
}

impl ExtractedMetrics {
    /// Build metrics from already-read values.
    #[must_use]
    pub const fn new(battery: Option<i32>, altitude: Option<i32>, speed: Option<i32>) -> Self {
        Self {
            battery,
            altitude,
            speed,
        }
    }

    /// Extract every field from `payload`.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        Self::new(
            extract(payload, TelemetryField::Battery),
            extract(payload, TelemetryField::Altitude),
            extract(payload, TelemetryField::Speed),
        )
    }

    /// Build metrics from per-field readings.
    #[must_use]
    pub fn from_readings(readings: &[(TelemetryField, FieldReading)]) -> Self {
        readings
            .iter()
            .fold(Self::default(), |mut metrics, (field, reading)| {
                metrics.set(*field, reading.value());
                metrics
            })
    }

    /// Value of `field`, if present.
    #[must_use]
    pub const fn get(&self, field: TelemetryField) -> Option<i32> {
        match field {
            TelemetryField::Battery => self.battery,
            TelemetryField::Altitude => self.altitude,
            TelemetryField::Speed => self.speed,
        }
    }

    /// Value of `field` with absence encoded as [`ABSENT`].
    #[must_use]
    pub fn encoded(&self, field: TelemetryField) -> i32 {
        self.get(field).unwrap_or(ABSENT)
    }

    fn set(&mut self, field: TelemetryField, value: Option<i32>) {
        match field {
            TelemetryField::Battery => self.battery = value,
            TelemetryField::Altitude => self.altitude = value,
            TelemetryField::Speed => self.speed = value,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
