use reqwest::blocking::Response as HttpResponse;
use serde::Deserialize;
use serde_json::{Map, Value};

const RAW_BODY_MAX_CHARS: usize = 500;

/// Shape of a failed response body, checked in priority order.
#[derive(Debug, Clone, PartialEq)]
enum ErrorBody {
    Message(Value),
    Error(ErrorField),
    Unrecognized(Value),
}

/// The `error` member is either a bare string or an object that may carry `message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Nested(Map<String, Value>),
    Other(Value),
}

impl ErrorBody {
    fn classify(body: Map<String, Value>) -> Self {
        if let Some(message) = body.get("message") {
            return Self::Message(message.clone());
        }
        if let Some(error) = body.get("error") {
            let field = serde_json::from_value::<ErrorField>(error.clone())
                .unwrap_or_else(|_| ErrorField::Other(error.clone()));
            return Self::Error(field);
        }
        Self::Unrecognized(Value::Object(body))
    }

    fn into_message(self) -> String {
        match self {
            Self::Message(message) => value_text(message),
            Self::Error(ErrorField::Text(text)) => text,
            Self::Error(ErrorField::Nested(detail)) => match detail.get("message") {
                Some(message) => value_text(message.clone()),
                None => Value::Object(detail).to_string(),
            },
            Self::Error(ErrorField::Other(value)) => value_text(value),
            Self::Unrecognized(body) => body.to_string(),
        }
    }
}

/// Best-effort human readable message for a failed API response.
///
/// JSON objects are searched for `message`, then `error` (string or object);
/// other objects are echoed back serialized. Anything that is not a JSON
/// object falls back to the first 500 characters of the raw body, or
/// `HTTP <status>` when the body is empty.
pub fn parse_api_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ErrorBody::classify(map).into_message(),
        _ => raw_body_fallback(status, body),
    }
}

/// Consumes a response and extracts its error message; a body that cannot be
/// read is treated as empty.
pub fn parse_api_error_response(response: HttpResponse) -> String {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    parse_api_error(status, &body)
}

fn raw_body_fallback(status: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    body.chars().take(RAW_BODY_MAX_CHARS).collect()
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
