//! Errors returned by the music API client.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the music API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        /// Parsed JSON error body, when there was one.
        body: Option<Value>,
    },

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access token missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Build an `Api` error from a status and raw response body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(summary_message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        Self::Api {
            status,
            message,
            body: parsed,
        }
    }

    /// First message the API reported for `field`.
    ///
    /// Django REST framework reports either a plain string (`"detail"`,
    /// `"error"`) or a list of strings per field (`"email": ["..."]`).
    #[must_use]
    pub fn field_message(&self, field: &str) -> Option<String> {
        match self {
            Self::Api {
                body: Some(body), ..
            } => body.get(field).and_then(first_string),
            _ => None,
        }
    }
}

/// Best single message for logs: `error`, `detail`, `email`, `password`,
/// then `non_field_errors`.
fn summary_message(body: &Value) -> Option<String> {
    const FIELDS: [(&str, &str); 5] = [
        ("error", ""),
        ("detail", ""),
        ("email", "Email: "),
        ("password", "Password: "),
        ("non_field_errors", ""),
    ];
    FIELDS.iter().find_map(|(field, prefix)| {
        body.get(field)
            .and_then(first_string)
            .map(|message| format!("{prefix}{message}"))
    })
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message_order() {
        let err = ApiError::from_response(400, r#"{"password": ["Too short."], "email": ["Taken."]}"#);
        assert_eq!(err.to_string(), "API error: 400 - Email: Taken.");

        let err = ApiError::from_response(400, r#"{"detail": "Nope", "error": "Items required"}"#);
        assert_eq!(err.to_string(), "API error: 400 - Items required");

        let err = ApiError::from_response(400, r#"{"non_field_errors": ["Mismatch."]}"#);
        assert_eq!(err.to_string(), "API error: 400 - Mismatch.");
    }

    #[test]
    fn test_non_json_body_is_truncated() {
        let body = "x".repeat(500);
        let ApiError::Api { message, body, .. } = ApiError::from_response(502, &body) else {
            panic!("expected Api error");
        };
        assert_eq!(message.len(), 200);
        assert!(body.is_none());
    }

    #[test]
    fn test_field_message() {
        let err = ApiError::from_response(
            401,
            r#"{"detail": "No active account found with the given credentials"}"#,
        );
        assert_eq!(
            err.field_message("detail").as_deref(),
            Some("No active account found with the given credentials")
        );
        assert_eq!(err.field_message("email"), None);
        assert_eq!(ApiError::Unauthorized.field_message("detail"), None);
    }
}
