//! Response normalization.
//!
//! Every platform call ends in one of two shapes: parsed data or an error
//! message. `decode` turns a raw [`TransportResponse`] into `Result<T>`, and
//! [`ApiResult`] is the serializable form tool consumers render.

use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeStruct};
use serde_json::Value;

use crate::{
    error::{BridgeError, Result},
    transport::TransportResponse,
};

/// Non-JSON error bodies are cut to this many characters.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Outcome of one platform call, tagged with the endpoint that produced it.
///
/// Serializes as `{"success": true, "endpoint": ..., "data": ...}` or
/// `{"success": false, "endpoint": ..., "error": "..."}`.
///
/// # Examples
///
/// ```
/// use commerce_mcp_bridge::{ApiResult, BridgeError};
///
/// let failed: ApiResult<()> = ApiResult::from_result(
///     "/categories/999999",
///     Err(BridgeError::UpstreamError { status: 404, message: "No such entity".into() }),
/// );
/// let json = serde_json::to_value(&failed).unwrap();
/// assert_eq!(json["success"], false);
/// assert!(json["error"].as_str().unwrap().contains("404"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    /// The call returned 2xx and the body parsed.
    Success {
        /// Endpoint that was called.
        endpoint: String,
        /// Parsed response body.
        data: T,
    },
    /// The call failed at any stage.
    Failure {
        /// Endpoint that was called.
        endpoint: String,
        /// Human-readable failure, including the upstream status when known.
        error: String,
    },
}

impl<T> ApiResult<T> {
    /// Wraps a client call outcome.
    pub fn from_result(endpoint: impl Into<String>, result: Result<T>) -> Self {
        let endpoint = endpoint.into();
        match result {
            Ok(data) => Self::Success { endpoint, data },
            Err(error) => Self::Failure { endpoint, error: error.to_string() },
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Endpoint that was called.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Success { endpoint, .. } | Self::Failure { endpoint, .. } => endpoint,
        }
    }

    /// Parsed data, if the call succeeded.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Error message, if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResult", 3)?;
        match self {
            Self::Success { endpoint, data } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("endpoint", endpoint)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure { endpoint, error } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("endpoint", endpoint)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Converts a raw response into parsed data or an error.
///
/// 2xx bodies are parsed as JSON into `T`; an empty body parses as `null`.
/// Anything else becomes [`BridgeError::UpstreamError`] with the platform's
/// message resolved.
pub(crate) fn decode<T: DeserializeOwned>(response: &TransportResponse) -> Result<T> {
    if !response.is_success() {
        return Err(BridgeError::UpstreamError {
            status: response.status,
            message: error_message(response.status, &response.body),
        });
    }

    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };

    serde_json::from_slice(body).map_err(|e| {
        BridgeError::ResponseError(format!(
            "status code {} body did not match expected shape: {e}",
            response.status
        ))
    })
}

/// Extracts a readable message from an error body.
pub(crate) fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body)
        && let Some(message) = value.get("message").and_then(Value::as_str)
    {
        return interpolate(message, value.get("parameters"));
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown error")
            .to_owned();
    }

    truncate(text, MAX_ERROR_BODY_CHARS)
}

/// Resolves `%1`-style placeholders from a list and `%name` placeholders from
/// a map. Unknown placeholders are left as written.
pub(crate) fn interpolate(message: &str, parameters: Option<&Value>) -> String {
    let Some(parameters) = parameters else {
        return message.to_owned();
    };

    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(after.len(), |(i, _)| i);
        let name = &after[..name_len];

        match lookup(parameters, name) {
            Some(replacement) => out.push_str(&replacement),
            None => {
                out.push('%');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

fn lookup(parameters: &Value, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let value = match parameters {
        Value::Array(items) => {
            let index: usize = name.parse().ok()?;
            items.get(index.checked_sub(1)?)?
        }
        Value::Object(map) => map.get(name)?,
        _ => return None,
    };
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse { status, body: body.as_bytes().to_vec(), headers: vec![] }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Category {
        id: u64,
        name: String,
    }

    #[test]
    fn test_decode_success_body() {
        let category: Category = decode(&response(200, r#"{"id":3,"name":"Gear"}"#)).unwrap();
        assert_eq!(category, Category { id: 3, name: "Gear".into() });
    }

    #[test]
    fn test_decode_empty_success_body_is_null() {
        let value: Value = decode(&response(204, "")).unwrap();
        assert_eq!(value, Value::Null);

        let unit: Option<Category> = decode(&response(200, "  \n")).unwrap();
        assert!(unit.is_none());
    }

    #[test]
    fn test_decode_shape_mismatch_is_response_error() {
        let result: Result<Category> = decode(&response(200, r#"{"unexpected":true}"#));
        assert!(matches!(result, Err(BridgeError::ResponseError(_))));
    }

    #[test]
    fn test_decode_upstream_error_with_named_parameters() {
        let body = r#"{"message":"No such entity with %fieldName = %fieldValue","parameters":{"fieldName":"id","fieldValue":"999999"}}"#;
        let err = decode::<Value>(&response(404, body)).unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "request failed with status code 404: No such entity with id = 999999"
        );
    }

    #[test]
    fn test_interpolate_positional_parameters() {
        let message = interpolate(
            "The \"%1\" value is invalid for %2.",
            Some(&json!(["abc", "pageSize"])),
        );
        assert_eq!(message, "The \"abc\" value is invalid for pageSize.");
    }

    #[test]
    fn test_interpolate_numeric_and_missing_parameters() {
        let message = interpolate("Max %1, got %2, see %3", Some(&json!([10, 11])));
        assert_eq!(message, "Max 10, got 11, see %3");
    }

    #[test]
    fn test_interpolate_keeps_literal_percent() {
        assert_eq!(interpolate("50% off %1", Some(&json!(["today"]))), "50% off today");
        assert_eq!(interpolate("100%", None), "100%");
    }

    #[test]
    fn test_error_message_non_json_body_verbatim() {
        assert_eq!(error_message(502, b"Bad Gateway from proxy"), "Bad Gateway from proxy");
    }

    #[test]
    fn test_error_message_truncates_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 50);
        let message = error_message(500, body.as_bytes());
        assert_eq!(message.len(), MAX_ERROR_BODY_CHARS + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_error_message_empty_body_uses_reason_phrase() {
        assert_eq!(error_message(401, b""), "Unauthorized");
        assert_eq!(error_message(599, b""), "unknown error");
    }

    #[test]
    fn test_error_message_json_without_message_field() {
        assert_eq!(error_message(400, br#"{"code":7}"#), r#"{"code":7}"#);
    }

    #[test]
    fn test_api_result_success_serialization() {
        let result = ApiResult::from_result("/categories/2", Ok(json!({"id": 2})));
        assert!(result.is_success());
        assert_eq!(result.endpoint(), "/categories/2");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "endpoint": "/categories/2", "data": {"id": 2}})
        );
    }

    #[test]
    fn test_api_result_failure_serialization() {
        let result: ApiResult<Value> = ApiResult::from_result(
            "/categories/999999",
            Err(BridgeError::UpstreamError { status: 404, message: "Not Found".into() }),
        );
        assert!(!result.is_success());
        assert!(result.data().is_none());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": false,
                "endpoint": "/categories/999999",
                "error": "request failed with status code 404: Not Found"
            })
        );
    }
}
