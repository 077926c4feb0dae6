//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports plus the service's
//! transport, configuration and observability plumbing.

/// Wall-clock adapter for the `Clock` port.
pub mod clock;

/// gRPC telemetry exchange server.
pub mod grpc;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing setup.
pub mod telemetry;
