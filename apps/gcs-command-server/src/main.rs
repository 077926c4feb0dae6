//! GCS Command Server Binary
//!
//! Starts the telemetry exchange gRPC server and its health endpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gcs-command-server
//! ```
//!
//! # Environment Variables
//!
//! - `GCS_BIND_ADDRESS`: Listen address (default: 0.0.0.0)
//! - `GCS_GRPC_PORT`: gRPC server port (default: 9090)
//! - `GCS_HEALTH_PORT`: Health check HTTP port, 0 disables (default: 8080)
//! - `GCS_STREAM_BUFFER`: Outbound channel capacity per stream (default: 32)
//! - `GCS_SHUTDOWN_GRACE_SECS`: Shutdown drain timeout (default: 10)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: gcs-command-server)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use gcs_command_server::proto::telemetry_exchange_service_server::TelemetryExchangeServiceServer;
use gcs_command_server::{
    HealthServer, HealthServerState, ServerConfig, TelemetryExchangeServer,
    TelemetryExchangeServerConfig, init_metrics, init_telemetry,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Keep the guard alive so spans are flushed on exit
    let _telemetry_guard = init_telemetry().context("failed to initialize telemetry")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting GCS command server"
    );

    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = ServerConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let server = TelemetryExchangeServer::new(TelemetryExchangeServerConfig::from(
        config.stream.clone(),
    ));
    let stats = server.stats();

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    // Spawn health server
    if let Some(health_addr) = config.health_addr() {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(&stats),
        ));
        let health_server = HealthServer::new(health_addr, health_state, shutdown_token.clone());

        tasks.push(tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        }));
    } else {
        tracing::info!("Health server disabled");
    }

    // Bind before spawning so readiness only flips once connections are accepted
    let listener = TcpListener::bind(config.grpc_addr())
        .await
        .with_context(|| format!("failed to bind gRPC listener on {}", config.grpc_addr()))?;
    let grpc_addr = listener.local_addr()?;
    stats.mark_serving();

    let grpc_shutdown = shutdown_token.clone();
    let grpc_stats = Arc::clone(&stats);
    tasks.push(tokio::spawn(async move {
        tracing::info!(addr = %grpc_addr, "gRPC server listening");

        let result = Server::builder()
            .add_service(TelemetryExchangeServiceServer::new(server))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                grpc_shutdown.clone().cancelled_owned(),
            )
            .await;

        grpc_stats.mark_stopped();
        if let Err(e) = result {
            tracing::error!(error = %e, "gRPC server error");
            grpc_shutdown.cancel();
        }
        tracing::info!("gRPC server stopped");
    }));

    tracing::info!("GCS command server ready");

    await_shutdown(shutdown_token).await;

    let drained = tokio::time::timeout(config.shutdown_grace, async {
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Server task panicked");
            }
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            timeout_secs = config.shutdown_grace.as_secs(),
            "Shutdown grace period elapsed with servers still running"
        );
    }

    tracing::info!("GCS command server stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ServerConfig) {
    tracing::info!(
        bind_address = %config.bind_address,
        grpc_port = config.grpc_port,
        health_port = config.health_port,
        stream_buffer = config.stream.buffer_capacity,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT) or an internal cancel.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            tracing::warn!("Server stopped unexpectedly, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
