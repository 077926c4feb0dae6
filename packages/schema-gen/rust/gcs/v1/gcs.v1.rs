// @generated
// This file is @generated by prost-build.
/// A message in either direction of the exchange.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TelemetryMessage {
    /// Sender identifier. Units use their call sign, the station uses "GCS".
    #[prost(string, tag = "1")]
    pub unit_id: ::prost::alloc::string::String,
    /// Message type tag, e.g. "TELEMETRY" inbound and "COMMAND" outbound.
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
    /// Free-text body. Telemetry reports embed fields such as
    /// "Battery: 80%, Altitude: 1200m, Speed: 180km/h".
    #[prost(string, tag = "3")]
    pub payload: ::prost::alloc::string::String,
    /// Wall-clock capture time in milliseconds since the Unix epoch.
    #[prost(int64, tag = "4")]
    pub timestamp: i64,
}
include!("gcs.v1.tonic.rs");
// @@protoc_insertion_point(module)
