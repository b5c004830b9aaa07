//! Alarm classification and the two delivery channels
//!
//! Every alarm goes to Slack; alarms classified critical are also escalated
//! to a phone call.

mod classifier;
mod notifier;
mod voice;

pub use classifier::{classify, Severity};
pub use notifier::{ChatNotifier, SlackBlock, SlackMessage};
pub use voice::{VoiceCaller, CALL_SCRIPT};

use reqwest::Client;

use crate::error::{Error, Result};

/// HTTP client shared by both channels
///
/// Timeouts are left at the client defaults; the function runtime bounds each
/// invocation.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("billing-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}
