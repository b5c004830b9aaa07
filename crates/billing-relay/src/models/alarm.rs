//! Alarm payloads and the SNS envelope they arrive in

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// A CloudWatch billing alarm state change
///
/// Every field is optional. Publishers sometimes send partial payloads and the
/// relay still has to get a message out for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlarmEvent {
    /// Account the alarm belongs to
    #[serde(rename = "AWSAccountId", default, deserialize_with = "lenient_string")]
    pub aws_account_id: Option<String>,

    /// Region the alarm was raised in
    #[serde(rename = "Region", default, deserialize_with = "lenient_string")]
    pub region: Option<String>,

    /// Alarm name, which also drives severity classification
    #[serde(rename = "AlarmName", default, deserialize_with = "lenient_string")]
    pub alarm_name: Option<String>,

    /// Free-text description configured on the alarm
    #[serde(rename = "AlarmDescription", default, deserialize_with = "lenient_string")]
    pub alarm_description: Option<String>,

    /// State the alarm moved into (ALARM, OK, INSUFFICIENT_DATA)
    #[serde(rename = "NewStateValue", default, deserialize_with = "lenient_string")]
    pub new_state_value: Option<String>,
}

impl AlarmEvent {
    /// Alarm name, or the empty string when absent
    pub fn name(&self) -> &str {
        self.alarm_name.as_deref().unwrap_or_default()
    }

    /// Decode an alarm from the JSON text carried in an SNS message
    pub fn from_message(message: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(message)
            .map_err(|e| Error::malformed_event(format!("alarm message is not valid JSON: {e}")))?;

        if !value.is_object() {
            return Err(Error::malformed_event("alarm message is not a JSON object"));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::malformed_event(format!("unreadable alarm payload: {e}")))
    }

    /// Unwrap an SNS-delivered event and decode the alarm in its first record
    pub fn from_envelope(event: &Value) -> Result<Self> {
        let envelope = SnsEnvelope::deserialize(event)
            .map_err(|e| Error::malformed_event(format!("unexpected event envelope: {e}")))?;

        // Only the first record is read; anything after it is not inspected
        let first = envelope
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed_event("event envelope has no records"))?;

        let record = SnsRecord::deserialize(first)
            .map_err(|e| Error::malformed_event(format!("unexpected SNS record: {e}")))?;

        Self::from_message(&record.sns.message)
    }
}

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Records")]
    records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SnsRecord {
    #[serde(rename = "Sns")]
    sns: SnsMessage,
}

#[derive(Debug, Deserialize)]
struct SnsMessage {
    #[serde(rename = "Message")]
    message: String,
}

/// Accepts any JSON scalar as text; `null` reads as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
