//! Credential retrieval
//!
//! The relay never caches credentials: each notifier asks the
//! [`SecretAccessor`] for a fresh [`SecretBundle`] every time it runs.

mod aws;

pub use aws::AwsSecretStore;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// A backend that can hand out secret strings by identifier
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Name of this backend, for logs
    fn name(&self) -> &'static str;

    /// Fetch the raw secret string stored under `secret_id`
    async fn get_secret_string(&self, secret_id: &str) -> Result<String>;
}

/// Third-party credentials the relay needs for one delivery
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecretBundle {
    /// Slack incoming-webhook URL
    #[serde(rename = "slack_webhook_url")]
    pub webhook_url: Option<String>,
    /// Twilio account SID
    #[serde(rename = "twilio_account_sid")]
    pub voice_account_id: Option<String>,
    /// Twilio auth token
    #[serde(rename = "twilio_auth_token")]
    pub voice_auth_token: Option<String>,
    /// Number to call
    #[serde(rename = "twilio_to_number")]
    pub voice_to_number: Option<String>,
    /// Number to call from
    #[serde(rename = "twilio_from_number")]
    pub voice_from_number: Option<String>,
}

impl SecretBundle {
    /// Parse the JSON object stored in the secret
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::secret_retrieval(format!("secret is not a JSON credential object: {e}")))
    }

    /// Slack webhook URL
    pub fn webhook_url(&self) -> Result<&str> {
        required(self.webhook_url.as_deref(), "slack_webhook_url")
    }

    /// Twilio account SID
    pub fn voice_account_id(&self) -> Result<&str> {
        required(self.voice_account_id.as_deref(), "twilio_account_sid")
    }

    /// Twilio auth token
    pub fn voice_auth_token(&self) -> Result<&str> {
        required(self.voice_auth_token.as_deref(), "twilio_auth_token")
    }

    /// Destination number
    pub fn voice_to_number(&self) -> Result<&str> {
        required(self.voice_to_number.as_deref(), "twilio_to_number")
    }

    /// Caller ID number
    pub fn voice_from_number(&self) -> Result<&str> {
        required(self.voice_from_number.as_deref(), "twilio_from_number")
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::secret_retrieval(format!("secret is missing `{key}`"))),
    }
}

// The webhook URL embeds its own credential, so it is redacted along with the token.
impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: Option<&String>) -> Option<&'static str> {
            value.map(|_| "<redacted>")
        }

        f.debug_struct("SecretBundle")
            .field("webhook_url", &redact(self.webhook_url.as_ref()))
            .field("voice_account_id", &self.voice_account_id)
            .field("voice_auth_token", &redact(self.voice_auth_token.as_ref()))
            .field("voice_to_number", &self.voice_to_number)
            .field("voice_from_number", &self.voice_from_number)
            .finish()
    }
}

/// Resolves the configured secret identifier against a [`SecretStore`]
#[derive(Clone)]
pub struct SecretAccessor {
    store: Arc<dyn SecretStore>,
    secret_id: Option<String>,
}

impl SecretAccessor {
    /// Create an accessor for `secret_id` backed by `store`
    pub fn new(store: Arc<dyn SecretStore>, secret_id: Option<String>) -> Self {
        Self { store, secret_id }
    }

    /// Fetch the bundle for the configured identifier
    pub async fn fetch_secrets(&self) -> Result<SecretBundle> {
        let Some(secret_id) = self.secret_id.as_deref().filter(|id| !id.is_empty()) else {
            let err = Error::secret_retrieval("no secret identifier configured");
            error!(error = %err, "Error fetching secrets");
            return Err(err);
        };

        self.fetch(secret_id).await
    }

    /// Fetch the bundle stored under `secret_id`
    pub async fn fetch(&self, secret_id: &str) -> Result<SecretBundle> {
        let result = async {
            let raw = self.store.get_secret_string(secret_id).await?;
            SecretBundle::from_json(&raw)
        }
        .await;

        match result {
            Ok(bundle) => {
                debug!(store = self.store.name(), secret_id, "Fetched secrets");
                Ok(bundle)
            }
            Err(e) => {
                error!(store = self.store.name(), secret_id, error = %e, "Error fetching secrets");
                Err(e)
            }
        }
    }
}

/// In-memory store, used for local invocations and tests
#[derive(Debug, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl StaticSecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret string under `secret_id`
    #[must_use]
    pub fn with_secret(mut self, secret_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), secret.into());
        self
    }

    /// Number of lookups served so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_secret_string(&self, secret_id: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| Error::secret_retrieval(format!("secret {secret_id} not found")))
    }
}
