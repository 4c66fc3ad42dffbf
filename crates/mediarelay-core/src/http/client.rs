//! Transport client: one HTTP POST, one classified outcome
//!
//! The client never retries on its own; [`crate::http::retry`] decides what
//! to do with a [`TransportOutcome`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::http::builder::{PreparedRequest, WirePayload};
use crate::http::error::HttpError;
use crate::{Error, Result};

/// Configuration for the transport client
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
            user_agent: format!("mediarelay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Result of a single send
#[derive(Debug, Clone)]
pub enum TransportOutcome {
    /// 2xx with a JSON body
    Success(Value),
    /// Worth trying again: network errors, 5xx, 429, non-auth 4xx
    RetryableFailure(HttpError),
    /// Never retried: auth rejections, malformed bodies, unbuildable requests
    FatalFailure(HttpError),
}

impl TransportOutcome {
    fn from_error(error: HttpError) -> Self {
        if error.should_retry() {
            TransportOutcome::RetryableFailure(error)
        } else {
            TransportOutcome::FatalFailure(error)
        }
    }
}

/// HTTP client for provider API communication
#[derive(Debug, Clone)]
pub struct TransportClient {
    client: ReqwestClient,
}

impl TransportClient {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;
        Ok(Self { client })
    }

    pub fn with_default_config() -> Result<Self> {
        Self::new(&TransportConfig::default())
    }

    /// Issue a single POST and classify what came back
    #[instrument(skip(self, request), fields(url = %request.redacted_url(), multipart = request.is_multipart()))]
    pub async fn send(&self, request: &PreparedRequest) -> TransportOutcome {
        let headers = match to_header_map(&request.headers) {
            Ok(headers) => headers,
            Err(error) => return TransportOutcome::FatalFailure(error),
        };

        let body = match &request.body {
            WirePayload::Json(value) => match serde_json::to_vec(value) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return TransportOutcome::FatalFailure(HttpError::invalid_request(format!(
                        "Failed to serialize request body: {}",
                        e
                    )))
                }
            },
            WirePayload::Multipart(body) => body.as_bytes().to_vec(),
        };

        let response = match self
            .client
            .post(request.url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error = HttpError::from_request_error(e);
                warn!(error = %error, "Request failed before a response arrived");
                return TransportOutcome::from_error(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error = HttpError::from_response(response).await;
            debug!(status = status.as_u16(), classification = ?error.classification, "Provider returned an error status");
            return TransportOutcome::from_error(error);
        }

        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(e) => return TransportOutcome::from_error(HttpError::from_request_error(e)),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(json) => {
                debug!(status = status.as_u16(), bytes = raw.len(), "Provider returned success");
                TransportOutcome::Success(json)
            }
            Err(e) => TransportOutcome::FatalFailure(HttpError::malformed_body(status, &e, &raw)),
        }
    }
}

fn to_header_map(headers: &[(String, String)]) -> std::result::Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| HttpError::invalid_request(format!("Invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::invalid_request(format!("Invalid value for header '{}': {}", key, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}
