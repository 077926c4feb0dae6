//! gRPC Telemetry Exchange Server Implementation
//!
//! Implements the `TelemetryExchangeService` gRPC service: one command back
//! for every telemetry report, in order, on the same stream.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::Instrument;

use super::proto::gcs::v1::{
    TelemetryMessage, telemetry_exchange_service_server::TelemetryExchangeService,
};
use crate::application::ports::Clock;
use crate::application::services::CommandService;
use crate::domain::command::Command;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::StreamSettings;
use crate::infrastructure::metrics;

// =============================================================================
// Type Aliases
// =============================================================================

type StreamResult<T> = Result<Response<T>, Status>;
type BoxedStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;
type CommandSender = mpsc::Sender<Result<TelemetryMessage, Status>>;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the telemetry exchange server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryExchangeServerConfig {
    /// Capacity of each stream's outbound command channel.
    pub buffer_capacity: usize,
}

impl Default for TelemetryExchangeServerConfig {
    fn default() -> Self {
        Self::from(StreamSettings::default())
    }
}

impl From<StreamSettings> for TelemetryExchangeServerConfig {
    fn from(settings: StreamSettings) -> Self {
        Self {
            buffer_capacity: settings.buffer_capacity.max(1),
        }
    }
}

// =============================================================================
// Stream Statistics
// =============================================================================

/// Counters shared by every stream the server handles.
#[derive(Debug, Default)]
pub struct ExchangeStats {
    serving: AtomicBool,
    active_streams: AtomicU64,
    streams_opened: AtomicU64,
    messages_processed: AtomicU64,
    stream_errors: AtomicU64,
}

/// Point-in-time copy of [`ExchangeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeStatsSnapshot {
    /// Streams currently open.
    pub active_streams: u64,
    /// Streams opened since start.
    pub streams_opened: u64,
    /// Reports answered since start.
    pub messages_processed: u64,
    /// Streams ended by a transport error since start.
    pub stream_errors: u64,
}

impl ExchangeStats {
    /// Mark the gRPC listener as bound and accepting.
    pub fn mark_serving(&self) {
        self.serving.store(true, Ordering::Release);
    }

    /// Mark the gRPC listener as stopped.
    pub fn mark_stopped(&self) {
        self.serving.store(false, Ordering::Release);
    }

    /// Whether the gRPC listener is accepting streams.
    #[must_use]
    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }

    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> ExchangeStatsSnapshot {
        ExchangeStatsSnapshot {
            active_streams: self.active_streams.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            stream_errors: self.stream_errors.load(Ordering::Relaxed),
        }
    }

    fn open_stream(self: &Arc<Self>) -> ActiveStream {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
        let active = self.active_streams.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_stream_opened();
        metrics::set_active_streams(active);
        ActiveStream(Arc::clone(self))
    }

    fn record_message(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::Relaxed);
        metrics::record_stream_error();
    }
}

/// Keeps a stream counted as active until dropped.
struct ActiveStream(Arc<ExchangeStats>);

impl Drop for ActiveStream {
    fn drop(&mut self) {
        let remaining = self.0.active_streams.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::set_active_streams(remaining);
    }
}

// =============================================================================
// Stream Outcome
// =============================================================================

/// How a telemetry stream ended.
#[derive(Debug)]
enum StreamEnd {
    /// The client closed its side.
    Completed,
    /// The transport reported an error.
    Failed(Status),
    /// The response stream was dropped before the client finished.
    ClientGone,
}

// =============================================================================
// Server Implementation
// =============================================================================

/// gRPC server answering telemetry streams with commands.
pub struct TelemetryExchangeServer<C = SystemClock> {
    config: TelemetryExchangeServerConfig,
    service: Arc<CommandService<C>>,
    stats: Arc<ExchangeStats>,
}

impl TelemetryExchangeServer<SystemClock> {
    /// Create a server stamping commands with the system clock.
    #[must_use]
    pub fn new(config: TelemetryExchangeServerConfig) -> Self {
        Self::with_service(config, CommandService::new(SystemClock))
    }
}

impl<C: Clock> TelemetryExchangeServer<C> {
    /// Create a server around an existing command service.
    #[must_use]
    pub fn with_service(config: TelemetryExchangeServerConfig, service: CommandService<C>) -> Self {
        Self {
            config,
            service: Arc::new(service),
            stats: Arc::new(ExchangeStats::default()),
        }
    }

    /// Shared stream statistics, for health reporting.
    #[must_use]
    pub fn stats(&self) -> Arc<ExchangeStats> {
        Arc::clone(&self.stats)
    }
}

#[tonic::async_trait]
impl<C: Clock> TelemetryExchangeService for TelemetryExchangeServer<C> {
    type ExchangeDataStream = BoxedStream<TelemetryMessage>;

    async fn exchange_data(
        &self,
        request: Request<Streaming<TelemetryMessage>>,
    ) -> StreamResult<Self::ExchangeDataStream> {
        let remote_addr = request.remote_addr();
        let inbound = request.into_inner();

        let stream_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("telemetry_stream", %stream_id, remote = ?remote_addr);

        let (tx, rx) = mpsc::channel(self.config.buffer_capacity);
        let service = Arc::clone(&self.service);
        let stats = Arc::clone(&self.stats);
        let active = stats.open_stream();

        tokio::spawn(
            async move {
                tracing::info!("Stream opened");

                match pump_stream(inbound, tx, &service, &stats).await {
                    StreamEnd::Completed => {
                        tracing::info!("Stream completed by client");
                    }
                    StreamEnd::Failed(status) => {
                        stats.record_error();
                        tracing::error!(
                            code = ?status.code(),
                            status_message = status.message(),
                            "Stream error"
                        );
                    }
                    StreamEnd::ClientGone => {
                        tracing::debug!("Response stream dropped, stopping");
                    }
                }

                drop(active);
            }
            .instrument(span),
        );

        let stream = ReceiverStream::new(rx);
        Ok(Response::new(Box::pin(stream) as Self::ExchangeDataStream))
    }
}

/// Answer every report on `inbound` in order until it ends.
///
/// Each command is queued before the next report is read. Returning drops
/// `tx`, which closes the response stream.
async fn pump_stream<S, C>(
    mut inbound: S,
    tx: CommandSender,
    service: &CommandService<C>,
    stats: &ExchangeStats,
) -> StreamEnd
where
    S: Stream<Item = Result<TelemetryMessage, Status>> + Unpin,
    C: Clock,
{
    while let Some(item) = inbound.next().await {
        let message = match item {
            Ok(message) => message,
            Err(status) => return StreamEnd::Failed(status),
        };

        let started = Instant::now();
        metrics::record_telemetry_received();

        let reply = service.respond(&message.unit_id, &message.payload);
        for (field, reading) in &reply.assessment.readings {
            metrics::record_field_reading(*field, reading);
        }
        let advisory = reply.assessment.advisory;

        if tx.send(Ok(command_to_proto(reply.command))).await.is_err() {
            return StreamEnd::ClientGone;
        }

        stats.record_message();
        metrics::record_command_sent(&advisory);
        metrics::record_command_latency(started.elapsed());
    }

    StreamEnd::Completed
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn command_to_proto(command: Command) -> TelemetryMessage {
    TelemetryMessage {
        unit_id: command.unit_id,
        r#type: command.kind,
        payload: command.payload,
        timestamp: command.timestamp_ms,
    }
}

// =============================================================================
// Tests
// =============================================================================
