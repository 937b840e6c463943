//! API credential providers.
//!
//! The search stage never reads the process environment itself; it asks a
//! [`CredentialProvider`] handed to it at construction. Production code uses
//! [`EnvCredentials`], tests use [`StaticCredentials`].

use crate::error::{HarvestError, Result};

pub trait CredentialProvider: Send + Sync {
    /// Return the API key, or [`HarvestError::MissingCredential`].
    fn api_key(&self) -> Result<String>;
}

/// Reads the key from an environment variable (`SERPER_KEY` by default).
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(HarvestError::MissingCredential {
                var: self.var.clone(),
            }),
        }
    }
}

/// A fixed key, or none at all.
pub struct StaticCredentials(Option<String>);

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| HarvestError::MissingCredential {
                var: "<static>".to_string(),
            })
    }
}
