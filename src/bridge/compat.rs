//! Compatibility with content written against the old global-callback
//! bridge.
//!
//! Older bundles call operations by their historical names and expect
//! results to arrive through well-known `window` functions. Both are
//! translated here so the rest of the bridge only ever sees canonical
//! [`Operation`]s and [`BridgeResponse`]s.

use serde_json::Value as JsonValue;

use super::error::BridgeError;
use super::protocol::{BridgeRequest, BridgeResponse, Operation, Outcome, PUSH_TOKEN_SUBJECT};

/// Asset requested by the historical `loadQuranJson` call.
pub const LEGACY_SCRIPTURE_ASSET: &str = "quran.json";

/// Parses a request frame, accepting historical operation names.
pub fn decode_request(text: &str) -> Result<BridgeRequest, BridgeError> {
    let mut value: JsonValue =
        serde_json::from_str(text).map_err(|e| BridgeError::Malformed(e.to_string()))?;

    if let Some(frame) = value.as_object_mut() {
        let legacy = frame.get("op").and_then(JsonValue::as_str).map(str::to_owned);
        match legacy.as_deref() {
            Some("triggerVibration") => {
                frame.insert("op".into(), "vibrate".into());
            }
            Some("getFCMToken") => {
                frame.insert("op".into(), "getPushToken".into());
            }
            Some("loadQuranJson") => {
                frame.insert("op".into(), "loadAsset".into());
                frame.insert("path".into(), LEGACY_SCRIPTURE_ASSET.into());
            }
            _ => {}
        }
    }

    serde_json::from_value(value).map_err(|e| BridgeError::Malformed(e.to_string()))
}

/// Renders a response as the script old content expects to have evaluated.
pub fn callback_script(response: &BridgeResponse) -> String {
    let subject = js_escape(&response.subject);
    match &response.outcome {
        Outcome::Success { payload } if response.subject == PUSH_TOKEN_SUBJECT => guarded_call(
            "androidFCMTokenReceived",
            &format!("'{}'", js_escape(payload)),
        ),
        Outcome::Success { payload } => guarded_call(
            "__onAssetLoaded__",
            &format!("'{}','{}'", subject, js_escape(payload)),
        ),
        // Push token failures are reported as an empty token.
        Outcome::Error { .. } if response.subject == PUSH_TOKEN_SUBJECT => {
            guarded_call("androidFCMTokenReceived", "''")
        }
        Outcome::Error { .. } => guarded_call("__onAssetLoadError__", &format!("'{}'", subject)),
    }
}

/// Historical name for an operation, if it had one.
pub fn legacy_name(op: &Operation) -> Option<&'static str> {
    match op {
        Operation::Vibrate => Some("triggerVibration"),
        Operation::GetPushToken => Some("getFCMToken"),
        Operation::LoadAsset { path } if path == LEGACY_SCRIPTURE_ASSET => Some("loadQuranJson"),
        _ => None,
    }
}

fn guarded_call(function: &str, args: &str) -> String {
    format!(
        "if(typeof window.{f}==='function'){{window.{f}({a});}}",
        f = function,
        a = args
    )
}

fn js_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' if chars.peek() == Some(&'/') => out.push_str("<\\"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_names_map_to_canonical() {
        let vibrate = decode_request(r#"{"id": 1, "op": "triggerVibration"}"#).unwrap();
        assert_eq!(vibrate.op, Operation::Vibrate);

        let token = decode_request(r#"{"id": 2, "op": "getFCMToken"}"#).unwrap();
        assert_eq!(token.op, Operation::GetPushToken);

        let quran = decode_request(r#"{"id": 3, "op": "loadQuranJson"}"#).unwrap();
        assert_eq!(
            quran.op,
            Operation::LoadAsset {
                path: "quran.json".into()
            }
        );
        assert_eq!(legacy_name(&quran.op), Some("loadQuranJson"));
    }

    #[test]
    fn test_canonical_names_pass_through() {
        let request =
            decode_request(r#"{"id": 9, "op": "loadAsset", "path": "daily_actions.json"}"#)
                .unwrap();
        assert_eq!(request.id, 9);
        assert_eq!(request.op.subject(), "daily_actions.json");
    }

    #[test]
    fn test_malformed_frames_rejected() {
        assert!(matches!(
            decode_request("not json"),
            Err(BridgeError::Malformed(_))
        ));
        assert!(matches!(
            decode_request(r#"{"id": 1, "op": "selfDestruct"}"#),
            Err(BridgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_callback_scripts() {
        let loaded = callback_script(&BridgeResponse::success(1, "it's.json", "QUJD"));
        assert_eq!(
            loaded,
            "if(typeof window.__onAssetLoaded__==='function'){window.__onAssetLoaded__('it\\'s.json','QUJD');}"
        );

        let failed = callback_script(&BridgeResponse::error(2, "x.json", "not found"));
        assert_eq!(
            failed,
            "if(typeof window.__onAssetLoadError__==='function'){window.__onAssetLoadError__('x.json');}"
        );

        let token = callback_script(&BridgeResponse::success(3, PUSH_TOKEN_SUBJECT, "a\nb"));
        assert!(token.contains("window.androidFCMTokenReceived('a\\nb')"));

        let no_token = callback_script(&BridgeResponse::error(4, PUSH_TOKEN_SUBJECT, "offline"));
        assert!(no_token.contains("window.androidFCMTokenReceived('')"));
    }

    #[test]
    fn test_js_escape_closing_script_tag() {
        assert_eq!(js_escape("</script>"), "<\\/script>");
    }
}
