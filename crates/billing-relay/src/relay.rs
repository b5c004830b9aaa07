//! Event entry point
//!
//! One call to [`Relay::handle`] takes one SNS envelope through the whole
//! pipeline, strictly in order:
//!
//! 1. decode the alarm from the first record
//! 2. classify it by name
//! 3. post it to Slack (always)
//! 4. place the escalation call (critical alarms only)
//!
//! Any failure stops the pipeline where it happened. Side effects that already
//! went out (a Slack post before a failed call) are not undone.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::alerting::{http_client, ChatNotifier, Severity, VoiceCaller};
use crate::config::Config;
use crate::error::Result;
use crate::models::{AlarmEvent, InvocationResponse, InvocationResult};
use crate::secrets::{SecretAccessor, SecretStore};

/// Routes billing alarms to Slack and, when critical, to a phone call
#[derive(Clone)]
pub struct Relay {
    chat: ChatNotifier,
    voice: VoiceCaller,
}

impl Relay {
    /// Assemble a relay from its two channels
    pub fn new(chat: ChatNotifier, voice: VoiceCaller) -> Self {
        Self { chat, voice }
    }

    /// Build both channels from configuration, sharing one HTTP client and
    /// one secret store
    pub fn from_config(config: &Config, store: Arc<dyn SecretStore>) -> Result<Self> {
        let client = http_client()?;
        let secrets = SecretAccessor::new(store, config.secrets.secret_id.clone());

        Ok(Self::new(
            ChatNotifier::new(client.clone(), secrets.clone()),
            VoiceCaller::new(client, secrets, &config.voice)?,
        ))
    }

    /// Relay one event envelope
    pub async fn handle(&self, event: &Value) -> Result<InvocationResult> {
        let result = self.relay(event).await;

        if let Err(e) = &result {
            error!(error = %e, "Error processing notification");
        }

        result
    }

    /// Relay one event and render the runtime response
    pub async fn respond(&self, event: &Value) -> Result<InvocationResponse> {
        self.handle(event).await?.into_response()
    }

    async fn relay(&self, event: &Value) -> Result<InvocationResult> {
        let alarm = AlarmEvent::from_envelope(event)?;
        let severity = Severity::from_alarm_name(alarm.name());

        info!(
            alarm = alarm.name(),
            state = alarm.new_state_value.as_deref().unwrap_or_default(),
            severity = severity.as_str(),
            "Relaying billing alarm"
        );

        let chat_status = self.chat.notify(&alarm, severity.is_critical()).await?;

        let call_id = if severity.is_critical() {
            Some(self.voice.place_call().await?)
        } else {
            None
        };

        Ok(InvocationResult::delivered(chat_status, call_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoiceConfig;
    use crate::error::Error;
    use crate::secrets::StaticSecretStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET_ID: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:billing";

    struct Harness {
        slack: MockServer,
        twilio: MockServer,
        store: Arc<StaticSecretStore>,
        relay: Relay,
    }

    impl Harness {
        async fn start() -> Self {
            Self::start_with(|slack, _| format!("{}/services/T000/B000/XXXX", slack.uri())).await
        }

        async fn start_with(webhook: impl Fn(&MockServer, &MockServer) -> String) -> Self {
            let slack = MockServer::start().await;
            let twilio = MockServer::start().await;

            let store = Arc::new(StaticSecretStore::new().with_secret(
                SECRET_ID,
                json!({
                    "slack_webhook_url": webhook(&slack, &twilio),
                    "twilio_account_sid": "AC123",
                    "twilio_auth_token": "s3cr3t",
                    "twilio_to_number": "+15551230000",
                    "twilio_from_number": "+15559870000"
                })
                .to_string(),
            ));

            let mut config = Config::default();
            config.secrets.secret_id = Some(SECRET_ID.to_string());
            config.voice = VoiceConfig {
                api_base: twilio.uri(),
            };

            let relay = Relay::from_config(&config, store.clone()).unwrap();

            Self {
                slack,
                twilio,
                store,
                relay,
            }
        }

        async fn expect_slack(&self, times: u64) {
            Mock::given(method("POST"))
                .and(path("/services/T000/B000/XXXX"))
                .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
                .expect(times)
                .mount(&self.slack)
                .await;
        }

        async fn expect_calls(&self, times: u64) {
            Mock::given(method("POST"))
                .and(path_regex(r"^/2010-04-01/Accounts/AC123/Calls\.json$"))
                .respond_with(
                    ResponseTemplate::new(201).set_body_json(json!({ "sid": "CA42", "status": "queued" })),
                )
                .expect(times)
                .mount(&self.twilio)
                .await;
        }
    }

    fn sns_event(alarm: &Value) -> Value {
        json!({
            "Records": [{
                "EventSource": "aws:sns",
                "EventVersion": "1.0",
                "Sns": {
                    "Type": "Notification",
                    "Subject": "ALARM: billing",
                    "Message": alarm.to_string()
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_critical_alarm_posts_and_calls() {
        let harness = Harness::start().await;
        harness.expect_slack(1).await;
        harness.expect_calls(1).await;

        let event = sns_event(&json!({
            "AWSAccountId": "123456789012",
            "Region": "us-east-1",
            "AlarmName": "Billing-Critical-Alert",
            "AlarmDescription": "Estimated charges above $10",
            "NewStateValue": "ALARM"
        }));

        let result = harness.relay.handle(&event).await.unwrap();

        assert_eq!(result, InvocationResult::delivered(200, Some("CA42".to_string())));
        // Slack and Twilio each fetched their own bundle
        assert_eq!(harness.store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_warning_alarm_posts_without_calling() {
        let harness = Harness::start().await;
        harness.expect_slack(1).await;
        harness.expect_calls(0).await;

        let event = sns_event(&json!({ "AlarmName": "Billing-Warning", "NewStateValue": "ALARM" }));
        let response = harness.relay.respond(&event).await.unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"slack_status":200,"call_sid":null}"#);
        assert_eq!(harness.store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_records_fails_before_any_request() {
        let harness = Harness::start().await;
        harness.expect_slack(0).await;
        harness.expect_calls(0).await;

        let err = harness
            .relay
            .handle(&json!({ "source": "aws.cloudwatch" }))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedEvent(_)));
        assert_eq!(harness.store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_secret_failure_sends_nothing() {
        let slack = MockServer::start().await;
        let twilio = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&slack)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&twilio)
            .await;

        let mut config = Config::default();
        config.voice.api_base = twilio.uri();
        let relay = Relay::from_config(&config, Arc::new(StaticSecretStore::new())).unwrap();

        let event = sns_event(&json!({ "AlarmName": "Billing-Critical-Alert" }));
        let err = relay.handle(&event).await.unwrap_err();

        assert!(matches!(err, Error::SecretRetrieval(_)));
    }

    #[tokio::test]
    async fn test_unreachable_slack_skips_call() {
        let harness = Harness::start_with(|_, _| "http://127.0.0.1:1/hook".to_string()).await;
        harness.expect_calls(0).await;

        let event = sns_event(&json!({ "AlarmName": "Billing-Critical-Alert" }));
        let err = harness.relay.handle(&event).await.unwrap_err();

        assert!(matches!(err, Error::Notification(_)));
        assert_eq!(harness.store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_call_fails_invocation_after_slack() {
        let harness = Harness::start().await;
        harness.expect_slack(1).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&harness.twilio)
            .await;

        let event = sns_event(&json!({ "AlarmName": "billing-CRITICAL" }));
        let err = harness.relay.handle(&event).await.unwrap_err();

        assert!(matches!(err, Error::CallPlacement(_)));
    }
}
