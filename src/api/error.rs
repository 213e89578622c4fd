use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Failed to read response body: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        ApiError::Server {
            status,
            message: extract_error_message(status, body),
        }
    }
}

/// Message to show for a failed request: the body's `message`, `detail` or
/// `error` field, else a generic line with the status.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "detail", "error"].iter().find_map(|key| {
                match v.get(*key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    // {"error": {"message": "..."}}
                    Some(Value::Object(inner)) => inner
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                    _ => None,
                }
            })
        })
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_fields_in_order() {
        assert_eq!(
            extract_error_message(400, r#"{"detail": "d", "message": "m"}"#),
            "m"
        );
        assert_eq!(extract_error_message(422, r#"{"detail": "bad marks"}"#), "bad marks");
        assert_eq!(
            extract_error_message(500, r#"{"error": {"message": "boom"}}"#),
            "boom"
        );
    }

    #[test]
    fn falls_back_to_status() {
        assert_eq!(
            extract_error_message(502, "<html>Bad Gateway</html>"),
            "request failed with status 502"
        );
        assert_eq!(
            extract_error_message(404, r#"{"message": "  "}"#),
            "request failed with status 404"
        );
        assert_eq!(
            extract_error_message(500, r#"{"error": {"message": ""}}"#),
            "request failed with status 500"
        );
    }
}
