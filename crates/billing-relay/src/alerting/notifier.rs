//! Slack delivery for billing alarms

use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::models::AlarmEvent;
use crate::secrets::SecretAccessor;

/// Rendered in place of a field the alarm did not carry
const MISSING_FIELD: &str = "None";

/// Posts alarm summaries to a Slack incoming webhook
#[derive(Clone)]
pub struct ChatNotifier {
    client: Client,
    secrets: SecretAccessor,
}

impl ChatNotifier {
    /// Create a notifier that resolves its webhook through `secrets`
    pub fn new(client: Client, secrets: SecretAccessor) -> Self {
        Self { client, secrets }
    }

    /// Send the alarm to Slack and return the webhook's HTTP status
    ///
    /// A non-2xx status is logged and returned, not treated as an error. Only
    /// a request that never got a response fails.
    pub async fn notify(&self, alarm: &AlarmEvent, is_critical: bool) -> Result<u16> {
        let secrets = self.secrets.fetch_secrets().await?;
        let webhook_url = secrets.webhook_url().map_err(|e| {
            error!(error = %e, "Error sending Slack notification");
            e
        })?;

        let payload = SlackMessage::for_alarm(alarm, is_critical);

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Error sending Slack notification");
                Error::Notification(e)
            })?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), critical = is_critical, "Slack notification sent");
        } else {
            warn!(status = status.as_u16(), critical = is_critical, "Slack webhook returned non-success status");
        }

        Ok(status.as_u16())
    }
}

/// Slack webhook payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    /// Fallback text, shown in notifications
    pub text: String,
    /// Layout blocks
    pub blocks: Vec<SlackBlock>,
}

/// A section block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: SlackText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SlackText {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl SlackMessage {
    /// Build the message for an alarm
    pub fn for_alarm(alarm: &AlarmEvent, is_critical: bool) -> Self {
        let headline = if is_critical {
            ":rotating_light: CRITICAL AWS Billing Alert! :rotating_light:"
        } else {
            ":warning: AWS Billing Warning"
        };

        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING_FIELD.to_string());

        let body = format!(
            "{}*AWS Billing Alert*\nAccount: {}\nRegion: {}\nAlarm: {}\nDescription: {}\nState: {}",
            if is_critical { "*CRITICAL* " } else { "" },
            field(&alarm.aws_account_id),
            field(&alarm.region),
            field(&alarm.alarm_name),
            field(&alarm.alarm_description),
            field(&alarm.new_state_value),
        );

        Self {
            text: headline.to_string(),
            blocks: vec![SlackBlock {
                kind: "section",
                text: SlackText {
                    kind: "mrkdwn",
                    text: body,
                },
            }],
        }
    }
}
