//! gRPC Telemetry Exchange
//!
//! Implements the `TelemetryExchangeService` bidirectional stream.
//!
//! # Architecture
//!
//! Each `ExchangeData` call gets its own task that:
//!
//! 1. Reads the next telemetry report from the inbound stream
//! 2. Hands it to the `CommandService`
//! 3. Waits until the command is queued on the outbound channel
//! 4. Repeats until the client closes its side or the transport fails
//!
//! Dropping the outbound sender ends the response stream.

pub mod server;

// Allow clippy warnings and missing docs in generated code
/// Include generated protobuf code.
/// The generated code is in packages/schema-gen/rust/gcs/v1/
/// gcs.v1.rs includes gcs.v1.tonic.rs at the end
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod gcs {
        pub mod v1 {
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/gcs/v1/gcs.v1.rs"
            ));
        }
    }
}

pub use server::{
    ExchangeStats, ExchangeStatsSnapshot, TelemetryExchangeServer, TelemetryExchangeServerConfig,
};
