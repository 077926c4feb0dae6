//! Telemetry Exchange Integration Tests
//!
//! Drives a real gRPC server over loopback with the generated client.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Server};

use gcs_command_server::{
    COMMAND_TYPE, Clock, CommandService, ExchangeStats, RESPONDER_ID, TelemetryExchangeServer,
    TelemetryExchangeServerConfig,
    proto::{
        TelemetryMessage, telemetry_exchange_service_client::TelemetryExchangeServiceClient,
        telemetry_exchange_service_server::TelemetryExchangeServiceServer,
    },
};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

async fn serve<C: Clock>(
    server: TelemetryExchangeServer<C>,
) -> (TelemetryExchangeServiceClient<Channel>, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(TelemetryExchangeServiceServer::new(server))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = TelemetryExchangeServiceClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    (client, handle)
}

/// Start a server stamping commands with the system clock.
async fn setup_test_server() -> (
    TelemetryExchangeServiceClient<Channel>,
    Arc<ExchangeStats>,
    tokio::task::JoinHandle<()>,
) {
    let server = TelemetryExchangeServer::new(TelemetryExchangeServerConfig::default());
    let stats = server.stats();
    let (client, handle) = serve(server).await;
    (client, stats, handle)
}

fn telemetry(unit_id: &str, payload: &str) -> TelemetryMessage {
    TelemetryMessage {
        unit_id: unit_id.to_string(),
        r#type: "TELEMETRY".to_string(),
        payload: payload.to_string(),
        timestamp: Utc::now().timestamp_millis(),
    }
}

async fn next_reply(
    stream: &mut tonic::Streaming<TelemetryMessage>,
) -> Option<TelemetryMessage> {
    timeout(READ_TIMEOUT, stream.message())
        .await
        .expect("timed out waiting for reply")
        .expect("stream returned an error")
}

async fn exchange_all(
    client: &mut TelemetryExchangeServiceClient<Channel>,
    messages: Vec<TelemetryMessage>,
) -> Vec<TelemetryMessage> {
    let response = client
        .exchange_data(tokio_stream::iter(messages))
        .await
        .unwrap();
    let mut stream = response.into_inner();

    let mut replies = Vec::new();
    while let Some(reply) = next_reply(&mut stream).await {
        replies.push(reply);
    }
    replies
}

#[tokio::test]
async fn every_report_gets_one_command_in_order() {
    let (mut client, _stats, server_handle) = setup_test_server().await;

    let replies = exchange_all(
        &mut client,
        vec![
            telemetry("UAV-1", "Battery: 20%, Altitude: 3000m, Speed: 100km/h"),
            telemetry("UAV-1", "Battery: 80%, Altitude: 6000m, Speed: 100km/h"),
            telemetry("UAV-1", "Battery: 80%, Altitude: 3000m, Speed: 300km/h"),
            telemetry("UAV-1", "Battery: 95%, Altitude: 500m, Speed: 100km/h"),
            telemetry("UAV-1", "Battery: 60%, Altitude: 2000m, Speed: 150km/h"),
        ],
    )
    .await;

    let payloads: Vec<&str> = replies.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(
        payloads,
        vec![
            "Battery critical (20%). Return to base immediately.",
            "Altitude too high (6000m). Descend to 4500m.",
            "Speed too high (300km/h). Reduce to 200km/h.",
            "All systems optimal. Ascend to mission altitude (1500m).",
            "Telemetry acknowledged. Maintain current trajectory.",
        ]
    );

    server_handle.abort();
}

#[tokio::test]
async fn reply_identifies_ground_station() {
    let (mut client, _stats, server_handle) = setup_test_server().await;

    let before = Utc::now().timestamp_millis();
    let replies = exchange_all(
        &mut client,
        vec![telemetry("UAV-7", "Battery: 50%, Altitude: 1200m, Speed: 90km/h")],
    )
    .await;
    let after = Utc::now().timestamp_millis();

    assert_eq!(replies.len(), 1);
    let reply = &replies[0];
    assert_eq!(reply.unit_id, RESPONDER_ID);
    assert_eq!(reply.r#type, COMMAND_TYPE);
    assert!(
        (before..=after).contains(&reply.timestamp),
        "timestamp {} outside [{before}, {after}]",
        reply.timestamp
    );

    server_handle.abort();
}

#[tokio::test]
async fn injected_clock_stamps_commands() {
    let server = TelemetryExchangeServer::with_service(
        TelemetryExchangeServerConfig::default(),
        CommandService::new(FixedClock(1_700_000_000_000)),
    );
    let (mut client, server_handle) = serve(server).await;

    let replies = exchange_all(&mut client, vec![telemetry("UAV-1", "Battery: 50%")]).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].timestamp, 1_700_000_000_000);

    server_handle.abort();
}

#[tokio::test]
async fn unparseable_reports_do_not_break_the_stream() {
    let (mut client, _stats, server_handle) = setup_test_server().await;

    let replies = exchange_all(
        &mut client,
        vec![
            telemetry("UAV-1", "Battery: 50%"),
            telemetry("UAV-1", "garbage ### no fields here"),
            telemetry("UAV-1", ""),
            telemetry("UAV-1", "Battery: 99999999999%, Altitude: 200m"),
            telemetry("UAV-1", "Battery: 10%"),
        ],
    )
    .await;

    let payloads: Vec<&str> = replies.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(
        payloads,
        vec![
            "Telemetry acknowledged. Maintain current trajectory.",
            "Telemetry acknowledged. Maintain current trajectory.",
            "Telemetry acknowledged. Maintain current trajectory.",
            "Telemetry acknowledged. Maintain current trajectory.",
            "Battery critical (10%). Return to base immediately.",
        ]
    );

    server_handle.abort();
}

#[tokio::test]
async fn empty_request_stream_yields_empty_response() {
    let (mut client, _stats, server_handle) = setup_test_server().await;

    let replies = exchange_all(&mut client, Vec::new()).await;
    assert!(replies.is_empty());

    server_handle.abort();
}

#[tokio::test]
async fn replies_arrive_before_next_report_is_sent() {
    let (mut client, _stats, server_handle) = setup_test_server().await;

    let (tx, rx) = mpsc::channel(1);
    let response = client
        .exchange_data(ReceiverStream::new(rx))
        .await
        .unwrap();
    let mut stream = response.into_inner();

    tx.send(telemetry("UAV-1", "Battery: 15%")).await.unwrap();
    let first = next_reply(&mut stream).await.unwrap();
    assert_eq!(
        first.payload,
        "Battery critical (15%). Return to base immediately."
    );

    tx.send(telemetry("UAV-1", "Speed: 400km/h")).await.unwrap();
    let second = next_reply(&mut stream).await.unwrap();
    assert_eq!(
        second.payload,
        "Speed too high (400km/h). Reduce to 200km/h."
    );

    // Closing the request side ends the response side
    drop(tx);
    assert!(next_reply(&mut stream).await.is_none());

    server_handle.abort();
}

#[tokio::test]
async fn concurrent_streams_are_independent() {
    let (client, stats, server_handle) = setup_test_server().await;

    let mut tasks = Vec::new();
    for unit in 0..4 {
        let mut client = client.clone();
        tasks.push(tokio::spawn(async move {
            let battery = 10 + unit * 20;
            let messages = (0..10)
                .map(|_| telemetry(&format!("UAV-{unit}"), &format!("Battery: {battery}%")))
                .collect();
            let replies = exchange_all(&mut client, messages).await;
            (battery, replies)
        }));
    }

    for task in tasks {
        let (battery, replies) = task.await.unwrap();
        assert_eq!(replies.len(), 10);
        let expected = if battery < 25 {
            format!("Battery critical ({battery}%). Return to base immediately.")
        } else {
            "Telemetry acknowledged. Maintain current trajectory.".to_string()
        };
        assert!(replies.iter().all(|r| r.payload == expected));
    }

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.streams_opened, 4);
    assert_eq!(snapshot.messages_processed, 40);

    server_handle.abort();
}
