//! Provider-neutral JSON-over-HTTP transport.
//!
//! Not the wire protocol of any particular event service: a small contract
//! that a gateway or test fixture can implement in a few lines.
//!
//! # Contract
//!
//! - `GET {endpoint}/health` with `Authorization: Bearer <secret>` opens the
//!   session. 401/403 means the credential was refused. A JSON body
//!   `{"max_batch_bytes": n}` advertises the batch ceiling.
//! - `POST {endpoint}/batches` with a [`WireBatch`] body submits a batch.
//!   2xx accepted; 408, 429 and 5xx transient; 401/403 and other 4xx rejected.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use hubcast_domain::{Credential, Endpoint, PublishTarget};

use crate::ports::{BatchFrame, Connector, IngestTransport, TransportError, DEFAULT_MAX_BATCH_BYTES};

/// Header carrying the credential principal, when the credential has one.
pub const PRINCIPAL_HEADER: &str = "X-Hubcast-Principal";

/// Time allowed for the health check that opens a session.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Wire Types
// =============================================================================

/// Batch body posted to `{endpoint}/batches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBatch {
    pub batch_id: Uuid,
    pub publisher_id: Uuid,
    pub target: PublishTarget,
    pub events: Vec<WireEvent>,
}

/// One event inside a [`WireBatch`]. Bodies are base64 (standard alphabet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl WireEvent {
    /// Decode the base64 body.
    pub fn decode_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.body)
    }
}

impl From<&BatchFrame> for WireBatch {
    fn from(frame: &BatchFrame) -> Self {
        Self {
            batch_id: frame.batch_id,
            publisher_id: frame.publisher_id,
            target: frame.target.clone(),
            events: frame
                .events
                .iter()
                .map(|event| WireEvent {
                    body: STANDARD.encode(event.body()),
                    partition_key: event.partition_key().map(str::to_string),
                    properties: event.properties().clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HealthResponse {
    max_batch_bytes: Option<usize>,
}

// =============================================================================
// HTTP Connector
// =============================================================================

/// Opens sessions against an HTTP ingestion gateway.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
    connect_timeout: Duration,
}

impl HttpConnector {
    /// Create a connector with a default `reqwest` client.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a preconfigured client (proxies, TLS roots).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bound the health check; expiry counts as unreachable.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        target: &PublishTarget,
    ) -> Result<Box<dyn IngestTransport>, TransportError> {
        let url = format!("{}/health", endpoint);
        let (status, body) = timeout(self.connect_timeout, async {
            let response = authorize(self.client.get(&url), credential).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await
        .map_err(|_| {
            TransportError::Unreachable(format!(
                "{}: no response within {:?}",
                url, self.connect_timeout
            ))
        })?
        .map_err(|e| TransportError::Unreachable(format!("{}: {}", url, e)))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized(format!(
                "{} refused the credential ({})",
                endpoint, status
            )));
        }
        if !status.is_success() {
            return Err(TransportError::Unreachable(format!(
                "{} health check returned {}",
                endpoint, status
            )));
        }

        let max_batch_bytes = advertised_ceiling(endpoint, &body)?;

        debug!(%endpoint, %target, max_batch_bytes, "HTTP session opened");

        Ok(Box::new(HttpTransport {
            client: self.client.clone(),
            batches_url: format!("{}/batches", endpoint),
            credential: credential.clone(),
            max_batch_bytes,
            closed: AtomicBool::new(false),
        }))
    }
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// Session handed out by `HttpConnector`.
pub struct HttpTransport {
    client: Client,
    batches_url: String,
    credential: Credential,
    max_batch_bytes: usize,
    closed: AtomicBool,
}

#[async_trait]
impl IngestTransport for HttpTransport {
    fn max_batch_bytes(&self) -> usize {
        self.max_batch_bytes
    }

    async fn send(&self, frame: &BatchFrame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let body = WireBatch::from(frame);
        let response = authorize(self.client.post(&self.batches_url), &self.credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        classify(response).await
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        debug!(url = %self.batches_url, "HTTP session closed");
        Ok(())
    }
}

/// Ceiling from the health body. An empty body means the default ceiling.
fn advertised_ceiling(endpoint: &Endpoint, body: &str) -> Result<usize, TransportError> {
    if body.trim().is_empty() {
        return Ok(DEFAULT_MAX_BATCH_BYTES);
    }

    let health = match serde_json::from_str::<HealthResponse>(body) {
        Ok(health) => health,
        Err(e) => {
            warn!(%endpoint, error = %e, "Unparseable health body, using default batch ceiling");
            HealthResponse::default()
        }
    };

    match health.max_batch_bytes {
        Some(0) => Err(TransportError::Rejected(format!(
            "{} advertised a batch ceiling of 0 bytes",
            endpoint
        ))),
        Some(max) => Ok(max),
        None => Ok(DEFAULT_MAX_BATCH_BYTES),
    }
}

fn authorize(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
    let request = request.bearer_auth(credential.expose_secret());
    match credential.principal() {
        Some(principal) => request.header(PRINCIPAL_HEADER, principal),
        None => request,
    }
}

async fn classify(response: Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let detail = response.text().await.unwrap_or_default();
    let reason = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, detail)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Err(TransportError::Network(reason))
        }
        s if s.is_server_error() => Err(TransportError::Network(reason)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TransportError::Unauthorized(reason)),
        _ => Err(TransportError::Rejected(reason)),
    }
}

// =============================================================================
// Tests
// =============================================================================
