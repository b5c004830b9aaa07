//! Phone escalation through the Twilio REST API

use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::config::VoiceConfig;
use crate::error::{Error, Result};
use crate::secrets::SecretAccessor;

/// TwiML spoken on every escalation call.
///
/// The amount is fixed and does not follow the alarm's actual threshold.
pub const CALL_SCRIPT: &str = "<Response><Say>Alert! AWS billing has exceeded 10 dollars. \
     Please check your AWS console immediately.</Say></Response>";

/// Places escalation calls
#[derive(Clone)]
pub struct VoiceCaller {
    client: Client,
    secrets: SecretAccessor,
    api_base: Url,
}

impl VoiceCaller {
    /// Create a caller against the configured Twilio API base
    pub fn new(client: Client, secrets: SecretAccessor, config: &VoiceConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| Error::config(format!("invalid voice api_base {}: {e}", config.api_base)))?;

        if api_base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "voice api_base {} cannot be used as a base URL",
                config.api_base
            )));
        }

        Ok(Self {
            client,
            secrets,
            api_base,
        })
    }

    /// Place the escalation call and return its call SID
    pub async fn place_call(&self) -> Result<String> {
        let secrets = self.secrets.fetch_secrets().await?;

        let account_sid = secrets.voice_account_id()?;
        let auth_token = secrets.voice_auth_token()?;
        let to = secrets.voice_to_number()?;
        let from = secrets.voice_from_number()?;

        let response = self
            .client
            .post(self.calls_url(account_sid)?)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("Twiml", CALL_SCRIPT), ("To", to), ("From", from)])
            .send()
            .await
            .map_err(|e| call_failed(format!("request to Twilio failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(call_failed(format!("Twilio returned {status}: {body}")));
        }

        let call: CallResource = response
            .json()
            .await
            .map_err(|e| call_failed(format!("unreadable Twilio response: {e}")))?;

        info!(call_sid = %call.sid, status = ?call.status, "Escalation call placed");
        Ok(call.sid)
    }

    /// `{api_base}/2010-04-01/Accounts/{sid}/Calls.json`
    fn calls_url(&self, account_sid: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config("voice api_base cannot be used as a base URL"))?
            .pop_if_empty()
            .extend(["2010-04-01", "Accounts", account_sid, "Calls.json"]);
        Ok(url)
    }
}

fn call_failed(msg: String) -> Error {
    let err = Error::call_placement(msg);
    error!(error = %err, "Error placing call");
    err
}

/// The subset of Twilio's call resource the relay reads
#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
    status: Option<String>,
}
