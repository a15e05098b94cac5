//! Sender configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{SendError, SendResult};
use hubcast_domain::{Credential, Endpoint, PublishTarget};
use hubcast_publisher::{PublisherConfig, DEFAULT_SEND_TIMEOUT};
use std::env;
use std::time::Duration;

/// Endpoint used in the test environment when none is configured.
const STUB_ENDPOINT: &str = "stub://local";

// =============================================================================
// Configuration
// =============================================================================

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment (test, development, production)
    pub environment: Environment,

    /// Ingestion endpoint
    pub endpoint: Endpoint,

    /// Credential presented to the endpoint
    pub credential: Credential,

    /// Routing for the batch
    pub target: PublishTarget,

    /// Batch size override (bytes)
    pub max_batch_bytes: Option<usize>,

    /// Timeout for the send call
    pub send_timeout: Duration,

    /// Message body to send
    pub message: String,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses the in-memory stub endpoint)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> SendResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> SendResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::load_environment(&lookup)?;

        let endpoint = match (lookup("HUBCAST_ENDPOINT"), environment) {
            (Some(address), _) => Endpoint::new(address)?,
            (None, Environment::Test) => Endpoint::new(STUB_ENDPOINT)?,
            (None, _) => {
                return Err(SendError::Config("HUBCAST_ENDPOINT is required".to_string()))
            }
        };

        let secret = match (lookup("HUBCAST_CREDENTIAL"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Test) => "test".to_string(),
            (None, _) => {
                return Err(SendError::Config("HUBCAST_CREDENTIAL is required".to_string()))
            }
        };
        let credential = match lookup("HUBCAST_CREDENTIAL_NAME") {
            Some(principal) => Credential::named(principal, secret)?,
            None => Credential::token(secret)?,
        };

        let target = PublishTarget::from_parts(
            lookup("HUBCAST_PARTITION_ID"),
            lookup("HUBCAST_PARTITION_KEY"),
        )?;

        let max_batch_bytes = match lookup("HUBCAST_MAX_BATCH_BYTES") {
            Some(value) => Some(value.parse::<usize>().map_err(|_| {
                SendError::Config(format!("Invalid HUBCAST_MAX_BATCH_BYTES: {}", value))
            })?),
            None => None,
        };

        let send_timeout = match lookup("HUBCAST_SEND_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(SendError::Config(format!(
                        "Invalid HUBCAST_SEND_TIMEOUT_SECS: {}",
                        value
                    )))
                }
            },
            None => DEFAULT_SEND_TIMEOUT,
        };

        let message = lookup("HUBCAST_MESSAGE").unwrap_or_else(|| "Single message".to_string());

        Ok(Self {
            environment,
            endpoint,
            credential,
            target,
            max_batch_bytes,
            send_timeout,
            message,
        })
    }

    /// Configuration for the test environment (stub endpoint, 5 s timeout).
    pub fn test() -> SendResult<Self> {
        let mut config = Self::from_lookup(|key| match key {
            "HUBCAST_ENV" => Some("test".to_string()),
            _ => None,
        })?;
        config.send_timeout = Duration::from_secs(5);
        Ok(config)
    }

    /// Publisher settings derived from this configuration.
    pub fn publisher_config(&self) -> PublisherConfig {
        let config = PublisherConfig::new(self.endpoint.clone(), self.credential.clone())
            .with_target(self.target.clone())
            .with_send_timeout(self.send_timeout);

        match self.max_batch_bytes {
            Some(max) => config.with_max_batch_bytes(max),
            None => config,
        }
    }

    fn load_environment<F>(lookup: &F) -> SendResult<Environment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("HUBCAST_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(SendError::Config(format!(
                "Invalid HUBCAST_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_test_environment_defaults() {
        let config = Config::from_lookup(lookup_from(&[("HUBCAST_ENV", "test")])).unwrap();

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.endpoint.as_str(), "stub://local");
        assert_eq!(config.target, PublishTarget::RoundRobin);
        assert_eq!(config.send_timeout, DEFAULT_SEND_TIMEOUT);
        assert_eq!(config.message, "Single message");
    }

    #[test]
    fn test_development_requires_endpoint_and_credential() {
        let missing_endpoint = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(missing_endpoint, Err(SendError::Config(_))));

        let missing_credential =
            Config::from_lookup(lookup_from(&[("HUBCAST_ENDPOINT", "http://localhost:8080")]));
        assert!(matches!(missing_credential, Err(SendError::Config(_))));
    }

    #[test]
    fn test_full_configuration() {
        let config = Config::from_lookup(lookup_from(&[
            ("HUBCAST_ENV", "prod"),
            ("HUBCAST_ENDPOINT", "https://ingest.example.com/"),
            ("HUBCAST_CREDENTIAL", "s3cret"),
            ("HUBCAST_CREDENTIAL_NAME", "send-policy"),
            ("HUBCAST_PARTITION_KEY", "device-7"),
            ("HUBCAST_MAX_BATCH_BYTES", "2048"),
            ("HUBCAST_SEND_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.endpoint.as_str(), "https://ingest.example.com");
        assert_eq!(config.credential.principal(), Some("send-policy"));
        assert_eq!(config.target.as_partition_key(), Some("device-7"));

        let publisher = config.publisher_config();
        assert_eq!(publisher.max_batch_bytes, Some(2048));
        assert_eq!(publisher.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        let base = [("HUBCAST_ENV", "test")];

        let bad_env = Config::from_lookup(lookup_from(&[("HUBCAST_ENV", "staging")]));
        assert!(matches!(bad_env, Err(SendError::Config(_))));

        let bad_size = Config::from_lookup(lookup_from(&[
            base[0],
            ("HUBCAST_MAX_BATCH_BYTES", "lots"),
        ]));
        assert!(matches!(bad_size, Err(SendError::Config(_))));

        let zero_timeout = Config::from_lookup(lookup_from(&[
            base[0],
            ("HUBCAST_SEND_TIMEOUT_SECS", "0"),
        ]));
        match zero_timeout {
            Err(SendError::Config(message)) => {
                assert!(message.contains("HUBCAST_SEND_TIMEOUT_SECS"))
            }
            other => panic!("expected config error, got {:?}", other),
        }

        let both_targets = Config::from_lookup(lookup_from(&[
            base[0],
            ("HUBCAST_PARTITION_ID", "0"),
            ("HUBCAST_PARTITION_KEY", "k"),
        ]));
        assert!(matches!(both_targets, Err(SendError::Domain(_))));
    }

    #[test]
    fn test_test_config() {
        let config = Config::test().unwrap();

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
