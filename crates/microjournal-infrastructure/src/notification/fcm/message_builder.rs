use reqwest::StatusCode;
use serde_json::json;

use microjournal_domain::push::{DeliveryOutcome, FailureKind, PushMessage};

/// How a single FCM response is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SendResult {
    Outcome(DeliveryOutcome),
    /// Credentials rejected; every other token would fail the same way.
    AuthRejected(String),
    /// No HTTP response at all (connect error, timeout).
    Unreachable(String),
}

impl super::FcmTransport {
    pub(super) fn build_message(&self, token: &str, message: &PushMessage) -> serde_json::Value {
        json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
            }
        })
    }
}

/// Map a non-success response to a result.
///
/// FCM reports the reason in `error.details[].errorCode`; `UNREGISTERED` and
/// `SENDER_ID_MISMATCH` mean the token is dead for good.
pub(super) fn classify_error(status: StatusCode, body: &str) -> SendResult {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SendResult::AuthRejected(format!("FCM rejected credentials with status {status}"));
    }

    let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    let error_code = parsed["error"]["details"]
        .as_array()
        .and_then(|details| {
            details
                .iter()
                .find_map(|detail| detail["errorCode"].as_str().map(str::to_string))
        })
        .or_else(|| parsed["error"]["status"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.as_str().to_string());

    let kind = match error_code.as_str() {
        "UNREGISTERED" | "SENDER_ID_MISMATCH" => FailureKind::Unregistered,
        _ => FailureKind::Transient,
    };

    SendResult::Outcome(DeliveryOutcome::failed(kind, error_code))
}
