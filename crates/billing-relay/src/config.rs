//! Configuration management for the billing relay
//!
//! Layers, lowest precedence first: built-in defaults, an optional config
//! file, `BILLING_RELAY__*` environment variables, and finally `SECRETS_ARN`,
//! which the function's deployment template sets directly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix for environment overrides, e.g. `BILLING_RELAY__VOICE__API_BASE`
pub const ENV_PREFIX: &str = "BILLING_RELAY";

/// Environment variable holding the secret identifier
pub const ENV_SECRETS_ARN: &str = "SECRETS_ARN";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Secret store configuration
    pub secrets: SecretsConfig,

    /// Telephony configuration
    pub voice: VoiceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Load configuration using an explicit environment map
    pub fn load_with_env(path: Option<&Path>, env: config::Map<String, String>) -> Result<Self> {
        let secrets_arn = env.get(ENV_SECRETS_ARN).cloned();

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(config_error)?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(Some(env)),
            )
            .set_override_option("secrets.secret_id", secrets_arn)
            .map_err(config_error)?
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> Error {
    Error::config(err.to_string())
}

/// Secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Identifier (name or ARN) of the credential secret
    pub secret_id: Option<String>,
    /// Region the secret lives in
    pub region: String,
    /// Endpoint override for Secrets Manager (LocalStack and similar)
    pub endpoint_url: Option<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            secret_id: None,
            region: "us-east-1".to_string(),
            endpoint_url: None,
        }
    }
}

/// Telephony configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Base URL of the Twilio REST API
    pub api_base: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for CloudWatch
    #[default]
    Json,
    /// Human readable
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with_env(None, env(&[])).unwrap();

        assert_eq!(config.secrets.secret_id, None);
        assert_eq!(config.secrets.region, "us-east-1");
        assert_eq!(config.voice.api_base, "https://api.twilio.com");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_secrets_arn_sets_secret_id() {
        let arn = "arn:aws:secretsmanager:us-east-1:123456789012:secret:billing-abc";
        let config = Config::load_with_env(None, env(&[(ENV_SECRETS_ARN, arn)])).unwrap();

        assert_eq!(config.secrets.secret_id.as_deref(), Some(arn));
    }

    #[test]
    fn test_prefixed_env_overrides() {
        let config = Config::load_with_env(
            None,
            env(&[
                ("BILLING_RELAY__SECRETS__REGION", "eu-west-1"),
                ("BILLING_RELAY__LOGGING__FORMAT", "pretty"),
            ]),
        )
        .unwrap();

        assert_eq!(config.secrets.region, "eu-west-1");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_then_secrets_arn_precedence() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[secrets]\nsecret_id = \"from-file\"\n\n[voice]\napi_base = \"http://localhost:9000\""
        )
        .unwrap();

        let config = Config::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.secrets.secret_id.as_deref(), Some("from-file"));
        assert_eq!(config.voice.api_base, "http://localhost:9000");

        let config =
            Config::load_with_env(Some(file.path()), env(&[(ENV_SECRETS_ARN, "from-env")])).unwrap();
        assert_eq!(config.secrets.secret_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load_with_env(Some(Path::new("/nonexistent/relay.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
