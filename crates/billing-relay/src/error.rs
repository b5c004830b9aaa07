//! Error types for the billing relay

use thiserror::Error;

/// Result type alias using the relay's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for relay operations
///
/// Nothing in the pipeline recovers from these: every variant is logged where
/// it happens and then propagated to the runtime, failing the invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// The secret store call failed, the identifier was missing, or the
    /// secret did not hold the expected credentials
    #[error("Secret retrieval failed: {0}")]
    SecretRetrieval(String),

    /// The inbound event envelope or the alarm payload inside it was unusable
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The chat webhook could not be reached
    #[error("Notification delivery failed: {0}")]
    Notification(#[from] reqwest::Error),

    /// The telephony provider rejected or never received the call request
    #[error("Call placement failed: {0}")]
    CallPlacement(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a secret retrieval error
    pub fn secret_retrieval(msg: impl Into<String>) -> Self {
        Self::SecretRetrieval(msg.into())
    }

    /// Create a malformed event error
    pub fn malformed_event(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }

    /// Create a call placement error
    pub fn call_placement(msg: impl Into<String>) -> Self {
        Self::CallPlacement(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
