//! Error types for the Search Console adapter.

use serde::Deserialize;

/// Result type for Search Console operations.
pub type GscResult<T> = Result<T, GscError>;

/// Errors raised while authenticating against or calling Search Console.
#[derive(Debug, thiserror::Error)]
pub enum GscError {
    /// Credential missing or malformed.
    #[error("{0}")]
    Config(String),

    /// OAuth2 token exchange failed.
    #[error("Autenticazione fallita: {0}")]
    Auth(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Search Console returned an error response.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// URL building error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GscError {
    /// Build an API error from a status code and the raw response body.
    ///
    /// Google wraps failures as `{"error": {"code", "message", "status"}}`;
    /// the inner message is passed through verbatim when present.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<GoogleErrorBody>(body) {
            Ok(parsed) if !parsed.error.message.is_empty() => Self::Api {
                status,
                message: parsed.error.message,
            },
            _ => Self::Api {
                status,
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_uses_google_message() {
        let body = r#"{"error":{"code":403,"message":"User does not have sufficient permission","status":"PERMISSION_DENIED"}}"#;
        let err = GscError::from_response(403, body);
        assert_eq!(err.to_string(), "User does not have sufficient permission");
        assert!(matches!(err, GscError::Api { status: 403, .. }));
    }

    #[test]
    fn test_from_response_falls_back_to_body() {
        let err = GscError::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = GscError::from_response(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
    }
}
