//! # Billing Relay
//!
//! Relays AWS billing alarms delivered over SNS to Slack, and escalates
//! critical ones to an automated phone call.
//!
//! ## Architecture
//!
//! - **Secrets**: credentials come from AWS Secrets Manager on every delivery
//! - **Alerting**: severity classification, Slack webhook and Twilio call channels
//! - **Relay**: the per-event pipeline run by the function runtime
//!
//! ## Quick Start
//!
//! ```bash
//! # Relay one SNS event locally
//! billing-relay invoke --event event.json --secrets-file secrets.json
//!
//! # Run under the Lambda runtime (the default with no subcommand)
//! billing-relay lambda
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod secrets;

pub use config::Config;
pub use error::{Error, Result};
pub use relay::Relay;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{classify, ChatNotifier, Severity, VoiceCaller};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::relay::Relay;
    pub use crate::secrets::{AwsSecretStore, SecretAccessor, SecretBundle, SecretStore, StaticSecretStore};
}
