//! Hubcast Sender
//!
//! Sends a single message to the configured ingestion endpoint.
//!
//! # Environment Variables
//!
//! - `HUBCAST_ENV`: Environment (test, development, production)
//! - `HUBCAST_ENDPOINT`: Ingestion endpoint (required outside test)
//! - `HUBCAST_CREDENTIAL`: Token or key value (required outside test)
//! - `HUBCAST_CREDENTIAL_NAME`: Optional principal / key name
//! - `HUBCAST_PARTITION_ID`: Fixed partition (exclusive with key)
//! - `HUBCAST_PARTITION_KEY`: Partition key (exclusive with id)
//! - `HUBCAST_MAX_BATCH_BYTES`: Batch size override
//! - `HUBCAST_SEND_TIMEOUT_SECS`: Send timeout (default: 60)
//! - `HUBCAST_MESSAGE`: Message body (default: "Single message")

use hubcast_send::{run, Config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("hubcast_send=info".parse()?)
                .add_directive("hubcast_publisher=info".parse()?),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        endpoint = %config.endpoint,
        target = %config.target,
        "Hubcast sender"
    );

    let report = run(&config).await?;

    info!(
        batch_id = %report.batch_id,
        bytes = report.bytes,
        "Sent messages in {} seconds",
        report.elapsed.as_secs_f64()
    );

    Ok(())
}
