use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - check the API key")]
    Unauthorized,

    #[error("Endpoint not found: {0}")]
    NotFound(String),

    #[error("Rate limited - request quota exhausted")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("API reported errors: {0}")]
    Reported(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            code => ApiError::Http {
                status: code,
                body: truncated,
            },
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::InvalidResponse(detail) => FetchError::MalformedPayload(detail),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), ApiError::RateLimited));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            ApiError::ServerError(body) if body == "upstream"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad param"),
            ApiError::Http { status: 400, body } if body == "bad param"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "tea"),
            ApiError::Http { status: 418, .. }
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.contains(&format!("{} total bytes", long.len())));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_into_fetch_error() {
        assert!(matches!(FetchError::from(ApiError::RateLimited), FetchError::Transport(_)));
        assert!(matches!(
            FetchError::from(ApiError::InvalidResponse("bad".to_string())),
            FetchError::MalformedPayload(_)
        ));
        // an unexpected status is a transport failure, the body was never parsed
        let rejected = FetchError::from(ApiError::from_status(StatusCode::BAD_REQUEST, "bad param"));
        assert_eq!(rejected, FetchError::Transport("HTTP 400: bad param".to_string()));
        // a 404 on the endpoint is a transport problem, not a missing entity
        assert!(!FetchError::from(ApiError::NotFound(String::new())).is_not_found());
    }
}
