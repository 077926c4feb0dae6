#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! GCS Command Server - Telemetry Advisory Endpoint
//!
//! A gRPC service acting as a ground control station. Field units open a
//! bidirectional stream, send free-text telemetry reports, and receive one
//! command advisory back for every report.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure evaluation core
//!   - `telemetry`: Field extraction from free-text payloads
//!   - `advisory`: Ordered threshold rule table
//!   - `command`: Outbound command shape
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Clock port
//!   - `services`: Telemetry-to-command service
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `grpc`: Bidirectional streaming server
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!   - `metrics`: Prometheus instrumentation
//!   - `telemetry`: Logging and OpenTelemetry setup
//!
//! # Data Flow
//!
//! ```text
//! Unit ──TelemetryMessage──► gRPC stream task ──► CommandService
//!                                                   │ extract fields
//!                                                   │ evaluate rules
//! Unit ◄──TelemetryMessage (COMMAND)── outbound ◄───┘ stamp command
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure evaluation core with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::advisory::Advisory;
pub use domain::command::{COMMAND_TYPE, Command, RESPONDER_ID};
pub use domain::telemetry::{
    ABSENT, ExtractedMetrics, FieldReading, TelemetryField, extract, read_field,
};

// Application
pub use application::ports::Clock;
pub use application::services::{Assessment, CommandService, Reply};

// Infrastructure config
pub use infrastructure::config::{ConfigError, ServerConfig, StreamSettings};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// gRPC server (for integration tests)
pub use infrastructure::grpc::{
    ExchangeStats, ExchangeStatsSnapshot, TelemetryExchangeServer, TelemetryExchangeServerConfig,
    proto::gcs::v1 as proto,
};

// Clock adapter
pub use infrastructure::clock::SystemClock;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{
    TelemetryConfig, TelemetryError, TelemetryGuard, init as init_telemetry,
};
