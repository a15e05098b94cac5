//! Endpoint Credentials
//!
//! Credential material presented to the ingestion endpoint when a session
//! is opened. How the endpoint validates it is up to the transport.
//!
//! # Security Model
//!
//! - The secret is held in `Zeroizing` memory and wiped on drop
//! - `Debug` never prints the secret
//! - Credentials are never serialized

use crate::value_objects::DomainError;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Credential for an ingestion endpoint (shared access token or named key).
#[derive(Clone)]
pub struct Credential {
    /// Optional principal (key name, client id)
    principal: Option<String>,
    /// Secret material (token, key value)
    secret: Zeroizing<String>,
}

impl Credential {
    /// Create a bearer-style credential from a bare token.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCredential` if the token is empty
    pub fn token(secret: impl Into<String>) -> Result<Self, DomainError> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(DomainError::InvalidCredential("Secret must be non-empty".to_string()));
        }
        Ok(Self {
            principal: None,
            secret,
        })
    }

    /// Create a credential bound to a named principal.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCredential` if either part is empty
    pub fn named(principal: impl Into<String>, secret: impl Into<String>) -> Result<Self, DomainError> {
        let principal = principal.into();
        if principal.is_empty() {
            return Err(DomainError::InvalidCredential("Principal must be non-empty".to_string()));
        }
        let mut credential = Self::token(secret)?;
        credential.principal = Some(principal);
        Ok(credential)
    }

    /// Principal name, if any.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Secret material. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }
}

impl Zeroize for Credential {
    fn zeroize(&mut self) {
        self.principal.zeroize();
        self.secret.zeroize();
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("principal", &self.principal)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
