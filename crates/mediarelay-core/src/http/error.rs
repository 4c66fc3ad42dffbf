//! HTTP error classification and normalization
//!
//! Normalizes provider-specific error responses into a uniform error format

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of HTTP errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Client errors (4xx other than auth) - retried, providers use 400 for throttling
    ClientError,
    /// Server errors (5xx) - should retry
    ServerError,
    /// Network errors and timeouts - should retry
    NetworkError,
    /// Rate limiting (429) - should retry
    RateLimitError,
    /// Authentication errors (401/403) - should not retry
    AuthenticationError,
    /// 2xx response whose body is not JSON - should not retry
    MalformedResponse,
    /// Request could not be constructed locally - never sent
    InvalidRequest,
}

impl ErrorClassification {
    /// Check if this error type should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorClassification::ClientError
                | ErrorClassification::ServerError
                | ErrorClassification::NetworkError
                | ErrorClassification::RateLimitError
        )
    }
}

/// Normalized HTTP error representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    /// HTTP status code if available
    pub status_code: Option<u16>,
    /// Error classification for retry logic
    pub classification: ErrorClassification,
    /// Provider-specific error code
    pub provider_code: Option<String>,
    /// Human-readable error message
    pub message: String,
    /// Parsed error body, when it was JSON
    pub details: Option<Value>,
}

impl HttpError {
    pub fn new(
        status_code: Option<u16>,
        classification: ErrorClassification,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            classification,
            provider_code: None,
            message: message.into(),
            details: None,
        }
    }

    /// Create from a non-success reqwest Response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status_and_body(status, &body)
    }

    /// Build from an already-read status and body
    pub fn from_status_and_body(status: StatusCode, body: &str) -> Self {
        let details = serde_json::from_str::<Value>(body).ok();
        let (provider_code, message) = Self::extract_provider_error(&details, body);

        Self {
            status_code: Some(status.as_u16()),
            classification: Self::classify_status(status),
            provider_code,
            message,
            details,
        }
    }

    /// Create from a network/request error.
    ///
    /// The URL is stripped first; query-placed credentials must not reach logs.
    pub fn from_request_error(error: reqwest::Error) -> Self {
        let error = error.without_url();
        let classification = if error.is_builder() {
            ErrorClassification::InvalidRequest
        } else {
            ErrorClassification::NetworkError
        };

        Self::new(error.status().map(|s| s.as_u16()), classification, error.to_string())
    }

    /// A 2xx response whose body could not be parsed; keeps the raw body for diagnostics
    pub fn malformed_body(status: StatusCode, parse_error: &serde_json::Error, raw_body: &str) -> Self {
        Self {
            status_code: Some(status.as_u16()),
            classification: ErrorClassification::MalformedResponse,
            provider_code: None,
            message: format!("Failed to parse response as JSON: {}", parse_error),
            details: Some(Value::String(raw_body.to_string())),
        }
    }

    /// A request rejected before it reached the network
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(None, ErrorClassification::InvalidRequest, message)
    }

    /// Classify HTTP status code
    fn classify_status(status: StatusCode) -> ErrorClassification {
        match status.as_u16() {
            401 | 403 => ErrorClassification::AuthenticationError,
            429 => ErrorClassification::RateLimitError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::ClientError,
        }
    }

    /// Extract provider-specific error information
    fn extract_provider_error(details: &Option<Value>, body: &str) -> (Option<String>, String) {
        if let Some(json) = details {
            // Graph and Gemini both nest under "error"; codes may be numeric
            if let Some(error) = json.get("error") {
                let code = error.get("code").and_then(|c| match c {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .or_else(|| error.as_str())
                    .unwrap_or(body)
                    .to_string();
                return (code, message);
            }

            if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                return (None, message.to_string());
            }
        }

        (None, body.to_string())
    }

    /// Check if this error should trigger a retry
    pub fn should_retry(&self) -> bool {
        self.classification.is_retryable()
    }

    /// Get the error classification
    pub fn classification(&self) -> ErrorClassification {
        self.classification
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} (classification: {:?})",
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.message,
            self.classification
        )
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ErrorClassification::ServerError.is_retryable());
        assert!(ErrorClassification::NetworkError.is_retryable());
        assert!(ErrorClassification::RateLimitError.is_retryable());
        assert!(ErrorClassification::ClientError.is_retryable());
        assert!(!ErrorClassification::AuthenticationError.is_retryable());
        assert!(!ErrorClassification::MalformedResponse.is_retryable());
        assert!(!ErrorClassification::InvalidRequest.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HttpError::classify_status(StatusCode::UNAUTHORIZED),
            ErrorClassification::AuthenticationError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorClassification::RateLimitError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_REQUEST),
            ErrorClassification::ClientError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_GATEWAY),
            ErrorClassification::ServerError
        );
    }

    #[test]
    fn test_graph_error_extraction() {
        let body = r#"{"error":{"message":"(#368) The action attempted has been deemed abusive","type":"OAuthException","code":368}}"#;
        let error = HttpError::from_status_and_body(StatusCode::BAD_REQUEST, body);

        assert_eq!(error.provider_code.as_deref(), Some("368"));
        assert!(error.message.contains("deemed abusive"));
        assert!(error.should_retry());
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let error = HttpError::from_status_and_body(StatusCode::SERVICE_UNAVAILABLE, "upstream down");
        assert_eq!(error.message, "upstream down");
        assert!(error.details.is_none());
    }

    #[test]
    fn test_malformed_body_keeps_raw_text() {
        let parse_error = serde_json::from_str::<Value>("<html>").unwrap_err();
        let error = HttpError::malformed_body(StatusCode::OK, &parse_error, "<html>");

        assert_eq!(error.classification(), ErrorClassification::MalformedResponse);
        assert_eq!(error.details, Some(Value::String("<html>".to_string())));
        assert!(!error.should_retry());
    }
}
