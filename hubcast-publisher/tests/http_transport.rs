//! Integration tests for the HTTP transport against an in-process gateway.
//!
//! Run with: `cargo test -p hubcast-publisher --test http_transport`

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use hubcast_domain::{Credential, Endpoint, EventPayload, PublishTarget};
use hubcast_publisher::{
    EventPublisher, HttpConnector, PublishError, PublisherConfig, WireBatch,
};

const GOOD_TOKEN: &str = "good-token";

#[derive(Clone)]
struct Gateway {
    batches: Arc<Mutex<Vec<WireBatch>>>,
    reply: StatusCode,
    delay: Duration,
}

impl Gateway {
    fn replying(reply: StatusCode) -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            reply,
            delay: Duration::ZERO,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::replying(StatusCode::ACCEPTED)
        }
    }
}

async fn health(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
    let expected = format!("Bearer {}", GOOD_TOKEN);
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == expected)
        .unwrap_or(false);

    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "max_batch_bytes": 4096 })))
}

async fn batches(State(gateway): State<Gateway>, Json(batch): Json<WireBatch>) -> StatusCode {
    tokio::time::sleep(gateway.delay).await;
    if gateway.reply.is_success() {
        gateway.batches.lock().await.push(batch);
    }
    gateway.reply
}

/// Serve the gateway on an ephemeral port and return its base URL.
async fn spawn_gateway(gateway: Gateway) -> String {
    let router = Router::new()
        .route("/health", get(health))
        .route("/batches", post(batches))
        .with_state(gateway);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn config(base_url: &str, token: &str) -> PublisherConfig {
    PublisherConfig::new(
        Endpoint::new(base_url).unwrap(),
        Credential::token(token).unwrap(),
    )
}

#[tokio::test]
async fn test_http_publish_round_trip() -> anyhow::Result<()> {
    let gateway = Gateway::replying(StatusCode::ACCEPTED);
    let base_url = spawn_gateway(gateway.clone()).await;

    let mut publisher = EventPublisher::open(
        config(&base_url, GOOD_TOKEN).with_target(PublishTarget::partition_key("device-7")?),
        &HttpConnector::new(),
    )
    .await?;

    // Ceiling advertised by the health check
    assert_eq!(publisher.max_batch_size(), 4096);

    let mut batch = publisher.create_batch(None)?;
    batch.add(EventPayload::from_text("Single message")?)?;
    batch.add(EventPayload::from_text("Second message")?.with_property("type", "greeting"))?;
    publisher.send_batch(&mut batch).await?;

    let received = gateway.batches.lock().await;
    assert_eq!(received.len(), 1);

    let wire = &received[0];
    assert_eq!(wire.batch_id, batch.id());
    assert_eq!(wire.publisher_id, publisher.id());
    assert_eq!(wire.target.as_partition_key(), Some("device-7"));
    assert_eq!(wire.events[0].decode_body()?, b"Single message");
    assert_eq!(wire.events[1].properties.get("type").map(String::as_str), Some("greeting"));

    Ok(())
}

#[tokio::test]
async fn test_http_open_with_bad_credential() {
    let base_url = spawn_gateway(Gateway::replying(StatusCode::ACCEPTED)).await;

    let result = EventPublisher::open(config(&base_url, "bad-token"), &HttpConnector::new()).await;

    match result {
        Err(PublishError::Connection { reason, .. }) => assert!(reason.contains("401")),
        other => panic!("expected connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_open_unreachable() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = EventPublisher::open(
        config(&format!("http://{}", addr), GOOD_TOKEN),
        &HttpConnector::new(),
    )
    .await;

    assert!(matches!(result, Err(PublishError::Connection { .. })));
}

async fn send_one(reply: StatusCode) -> Result<(), PublishError> {
    let base_url = spawn_gateway(Gateway::replying(reply)).await;
    let mut publisher = EventPublisher::open(config(&base_url, GOOD_TOKEN), &HttpConnector::new())
        .await
        .unwrap();

    let mut batch = publisher.create_batch(None).unwrap();
    batch.add(EventPayload::from_text("Single message").unwrap()).unwrap();
    publisher.send_batch(&mut batch).await
}

#[tokio::test]
async fn test_http_status_classification() {
    assert!(send_one(StatusCode::OK).await.is_ok());

    for status in [
        StatusCode::SERVICE_UNAVAILABLE,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::REQUEST_TIMEOUT,
    ] {
        let err = send_one(status).await.unwrap_err();
        assert!(
            matches!(err, PublishError::TransientSend { .. }),
            "{} should be transient, got {:?}",
            status,
            err
        );
    }

    for status in [
        StatusCode::BAD_REQUEST,
        StatusCode::PAYLOAD_TOO_LARGE,
        StatusCode::FORBIDDEN,
    ] {
        let err = send_one(status).await.unwrap_err();
        assert!(
            matches!(err, PublishError::RejectedBatch { .. }),
            "{} should be rejected, got {:?}",
            status,
            err
        );
    }
}

#[tokio::test]
async fn test_http_send_timeout() {
    let base_url = spawn_gateway(Gateway::slow(Duration::from_secs(30))).await;
    let mut publisher = EventPublisher::open(
        config(&base_url, GOOD_TOKEN).with_send_timeout(Duration::from_millis(200)),
        &HttpConnector::new(),
    )
    .await
    .unwrap();

    let mut batch = publisher.create_batch(None).unwrap();
    batch.add(EventPayload::from_text("Single message").unwrap()).unwrap();

    let started = std::time::Instant::now();
    let err = publisher.send_batch(&mut batch).await.unwrap_err();

    assert!(matches!(err, PublishError::TransientSend { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_http_open_silent_endpoint_times_out() {
    // Accepts TCP connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let connector = HttpConnector::new().with_connect_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let result = EventPublisher::open(config(&format!("http://{}", addr), GOOD_TOKEN), &connector).await;

    match result {
        Err(PublishError::Connection { reason, .. }) => assert!(reason.contains("no response")),
        other => panic!("expected connection error, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_http_open_zero_ceiling_refused() {
    let router = Router::new().route(
        "/health",
        get(|| async { Json(json!({ "max_batch_bytes": 0 })) }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let result = EventPublisher::open(
        config(&format!("http://{}", addr), GOOD_TOKEN),
        &HttpConnector::new(),
    )
    .await;

    match result {
        Err(PublishError::Connection { reason, .. }) => assert!(reason.contains("ceiling of 0")),
        other => panic!("expected connection error, got {:?}", other),
    }
}
