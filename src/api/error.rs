use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Terminal authentication failure with no retry avenue left.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A refresh was attempted and failed, or a retried request was
    /// rejected again. Credentials have been cleared.
    #[error("Session expired - please sign in again")]
    SessionExpired,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI wraps error messages as `{"detail": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Pull the human-readable message out of an error body, falling back to
/// the raw text when it is not the usual `{"detail": ...}` shape.
pub(crate) fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(text)) => return text,
            // Validation errors arrive as structured detail; keep them whole.
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    body.to_string()
}

/// Truncate a response body to avoid carrying excessive data in errors.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    // Cut on a char boundary; error text from this backend is often CJK.
    let cut = body
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= MAX_ERROR_BODY_LENGTH)
        .last()
        .unwrap_or(0);
    format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
}

/// The detail message, extracted and truncated, ready for an error variant.
pub(crate) fn short_detail(body: &str) -> String {
    truncate_body(&error_detail(body))
}

/// Whether a response is an authentication failure the pipeline should
/// react to.
///
/// 401 always counts. This backend has also historically wrapped
/// expired-token failures in 500s with an explanatory message, so a 5xx
/// whose detail mentions tokens or expiry is treated the same way.
pub(crate) fn is_auth_failure(status: reqwest::StatusCode, body: &str) -> bool {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return true;
    }
    if status.is_server_error() {
        let detail = error_detail(body).to_lowercase();
        return detail.contains("token") || detail.contains("expired");
    }
    false
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = short_detail(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError { status: status.as_u16(), detail },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SessionExpired => ApiError::SessionExpired,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn extracts_fastapi_detail() {
        assert_eq!(error_detail(r#"{"detail": "Token has expired"}"#), "Token has expired");
        assert_eq!(error_detail("plain text failure"), "plain text failure");
        // Structured validation detail survives as JSON text.
        let detail = error_detail(r#"{"detail": [{"loc": ["body"], "msg": "required"}]}"#);
        assert!(detail.contains("required"));
    }

    #[test]
    fn classifies_plain_401_as_auth_failure() {
        assert!(is_auth_failure(StatusCode::UNAUTHORIZED, ""));
        assert!(is_auth_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Could not validate credentials"}"#
        ));
    }

    #[test]
    fn classifies_disguised_500_by_message_text() {
        assert!(is_auth_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "Token has expired"}"#
        ));
        assert!(is_auth_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "Invalid TOKEN supplied"}"#
        ));
        // Case-insensitive, and "expired" alone is enough.
        assert!(is_auth_failure(
            StatusCode::BAD_GATEWAY,
            r#"{"detail": "Session Expired"}"#
        ));
    }

    #[test]
    fn ordinary_errors_are_not_auth_failures() {
        assert!(!is_auth_failure(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "boom"}"#));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND, r#"{"detail": "Article not found"}"#));
        assert!(!is_auth_failure(StatusCode::FORBIDDEN, r#"{"detail": "Admin required"}"#));
        // 4xx other than 401 never matches, even with suspicious text.
        assert!(!is_auth_failure(StatusCode::BAD_REQUEST, r#"{"detail": "token missing"}"#));
    }

    #[test]
    fn from_status_maps_the_taxonomy() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "{}"),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "{}"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "{}"),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "{}"),
            ApiError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        let long = "支".repeat(400); // 1200 bytes of three-byte chars
        let truncated = short_detail(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < long.len());

        let short = "short message";
        assert_eq!(short_detail(short), short);
    }
}
