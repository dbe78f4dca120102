//! Message types for the host bridge.
//!
//! Every frame is a JSON text message. Requests flow from content to host;
//! responses flow back and echo the request id plus the subject they
//! concern (an asset path, or [`PUSH_TOKEN_SUBJECT`]), so concurrent
//! requests can be correlated regardless of completion order.

use serde::{Deserialize, Serialize};

pub type RequestId = u64;

/// Subject carried by push-token responses.
pub const PUSH_TOKEN_SUBJECT: &str = "pushToken";

/// Operations the host exposes to embedded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    /// Fire-and-forget diagnostic line.
    Log { message: String },
    /// Fire-and-forget haptic pulse.
    Vibrate,
    /// Replies with the device push token (empty on failure).
    GetPushToken,
    /// Replies with the base64 bytes of a bundled asset, or an error.
    LoadAsset { path: String },
}

impl Operation {
    pub fn expects_reply(&self) -> bool {
        matches!(self, Operation::GetPushToken | Operation::LoadAsset { .. })
    }

    pub fn subject(&self) -> &str {
        match self {
            Operation::Log { .. } => "log",
            Operation::Vibrate => "vibrate",
            Operation::GetPushToken => PUSH_TOKEN_SUBJECT,
            Operation::LoadAsset { path } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: RequestId,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Success { payload: String },
    Error { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub id: RequestId,
    pub subject: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BridgeResponse {
    pub fn success(id: RequestId, subject: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            outcome: Outcome::Success {
                payload: payload.into(),
            },
        }
    }

    pub fn error(id: RequestId, subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            outcome: Outcome::Error {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Escapes characters that are unsafe inside HTML or an attribute value.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = BridgeRequest {
            id: 7,
            op: Operation::LoadAsset {
                path: "quran.json".into(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "op": "loadAsset", "path": "quran.json"})
        );

        let parsed: BridgeRequest =
            serde_json::from_str(r#"{"id": 3, "op": "getPushToken"}"#).unwrap();
        assert_eq!(parsed.op, Operation::GetPushToken);
    }

    #[test]
    fn test_response_wire_format() {
        let ok = BridgeResponse::success(1, "daily-wisdom.json", "W10=");
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["payload"], "W10=");
        assert_eq!(json["subject"], "daily-wisdom.json");

        let err: BridgeResponse = serde_json::from_str(
            r#"{"id": 2, "subject": "missing.json", "status": "error", "reason": "not found"}"#,
        )
        .unwrap();
        assert!(!err.is_success());
        assert_eq!(err.subject, "missing.json");
    }

    #[test]
    fn test_expects_reply() {
        assert!(!Operation::Vibrate.expects_reply());
        assert!(!Operation::Log {
            message: "x".into()
        }
        .expects_reply());
        assert!(Operation::GetPushToken.expects_reply());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("plain:token-123"), "plain:token-123");
    }
}
