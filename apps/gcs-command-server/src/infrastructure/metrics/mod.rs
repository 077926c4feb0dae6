//! Prometheus Metrics Module
//!
//! Exposes service metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Messages**: telemetry received, commands sent by advisory
//! - **Extraction**: absent and unparseable fields by field name
//! - **Streams**: active streams, streams opened, stream errors
//! - **Latency**: time from receiving a report to enqueuing its command
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::advisory::Advisory;
use crate::domain::telemetry::{FieldReading, TelemetryField};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Serializes recorder installation between concurrent callers.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the Prometheus metrics recorder.
///
/// Calling it again returns the handle installed by the first call.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "gcs_telemetry_received_total",
        "Total telemetry reports received from units"
    );
    describe_counter!(
        "gcs_commands_sent_total",
        "Total commands sent back to units, by advisory"
    );

    describe_counter!(
        "gcs_fields_absent_total",
        "Telemetry fields not present in a report, by field"
    );
    describe_counter!(
        "gcs_field_parse_failures_total",
        "Telemetry fields present but not parseable, by field"
    );

    describe_gauge!("gcs_active_streams", "Number of open telemetry streams");
    describe_counter!(
        "gcs_streams_opened_total",
        "Total telemetry streams opened"
    );
    describe_counter!(
        "gcs_stream_errors_total",
        "Total telemetry streams terminated by a transport error"
    );

    describe_histogram!(
        "gcs_command_latency_seconds",
        "Time from receiving a report to enqueuing its command"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a telemetry report received.
pub fn record_telemetry_received() {
    counter!("gcs_telemetry_received_total").increment(1);
}

/// Record a command sent for `advisory`.
pub fn record_command_sent(advisory: &Advisory) {
    counter!("gcs_commands_sent_total", "advisory" => advisory.kind()).increment(1);
}

/// Record the extraction outcome of one field.
pub fn record_field_reading(field: TelemetryField, reading: &FieldReading) {
    match reading {
        FieldReading::Present(_) => {}
        FieldReading::Missing => {
            counter!("gcs_fields_absent_total", "field" => field.as_str()).increment(1);
        }
        FieldReading::Malformed { .. } => {
            counter!("gcs_field_parse_failures_total", "field" => field.as_str()).increment(1);
        }
    }
}

/// Update the number of open streams.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_streams(count: u64) {
    gauge!("gcs_active_streams").set(count as f64);
}

/// Record a stream opened.
pub fn record_stream_opened() {
    counter!("gcs_streams_opened_total").increment(1);
}

/// Record a stream terminated by a transport error.
pub fn record_stream_error() {
    counter!("gcs_stream_errors_total").increment(1);
}

/// Record the time taken to answer one report.
pub fn record_command_latency(duration: Duration) {
    histogram!("gcs_command_latency_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_telemetry_received();
        record_command_sent(&Advisory::Acknowledged);
        record_field_reading(TelemetryField::Battery, &FieldReading::Missing);
        record_field_reading(
            TelemetryField::Speed,
            &FieldReading::Malformed {
                raw: "9".repeat(12),
                reason: "number too large".to_string(),
            },
        );
        set_active_streams(1);
        record_stream_opened();
        record_stream_error();
        record_command_latency(Duration::from_micros(250));
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_metrics().unwrap();
        let second = init_metrics().unwrap();

        record_command_sent(&Advisory::SystemsOptimal);

        let rendered = second.render();
        assert!(rendered.contains("gcs_commands_sent_total"));
        assert!(rendered.contains("advisory=\"systems_optimal\""));
        assert_eq!(first.render().is_empty(), rendered.is_empty());
    }
}
