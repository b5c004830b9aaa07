//! Invocation results and their wire shape

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of one relayed alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Status reported to the invoker; always 200 for a completed relay
    pub status_code: u16,
    /// HTTP status returned by the chat webhook
    pub chat_status: u16,
    /// Provider call identifier, present only when a call was placed
    pub call_id: Option<String>,
}

impl InvocationResult {
    /// Result of a relay that delivered everything it needed to
    pub fn delivered(chat_status: u16, call_id: Option<String>) -> Self {
        Self {
            status_code: 200,
            chat_status,
            call_id,
        }
    }

    /// Render the proxy-style response handed back to the function runtime
    pub fn into_response(self) -> Result<InvocationResponse> {
        let body = serde_json::to_string(&ResponseBody {
            slack_status: self.chat_status,
            call_sid: self.call_id,
        })?;

        Ok(InvocationResponse {
            status_code: self.status_code,
            body,
        })
    }
}

/// Response returned to the function runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// HTTP-style status code
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded [`ResponseBody`]
    pub body: String,
}

/// Body of an [`InvocationResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Chat webhook status
    pub slack_status: u16,
    /// Call identifier, `null` when no call was placed
    pub call_sid: Option<String>,
}
