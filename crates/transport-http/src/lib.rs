//! AutoGraph HTTP transport adapter.
//!
//! Implements [`binding::Transport`] by `POST`ing the query payload as JSON
//! with [`reqwest`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, timeouts, static headers, and the
//! translation of HTTP status codes into [`binding::RetryPolicy`] live here.
//! The [`binding`] crate sees only [`binding::Transport`].
//!
//! ## Status handling
//!
//! | Response | Result |
//! |----------|--------|
//! | `2xx` with a JSON body | `Ok(TransportResponse)` |
//! | `2xx` with a non-JSON body | `TransportError::InvalidBody` |
//! | `429`, `503` | `TransportError::Status`, retryable after `Retry-After` seconds |
//! | any other non-`2xx` | `TransportError::Status`, non-retryable |
//! | connect / TLS / timeout failure | `TransportError::Network` |

#![warn(missing_docs)]

mod config;

pub use config::{HttpTransportConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use binding::{
    QueryPayload, ResponseMetadata, RetryPolicy, StatusCode, Timestamp, Transport, TransportError,
    TransportResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use tracing::{debug, instrument, warn};

/// [`Transport`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    /// Builds a transport from `config`.
    ///
    /// Fails with [`TransportError::Configuration`] if the endpoint is not a
    /// valid URL or a header name or value is malformed.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let endpoint = reqwest::Url::parse(&config.endpoint).map_err(|e| {
            TransportError::Configuration {
                message: format!("invalid endpoint '{}': {e}", config.endpoint),
            }
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers(config)?)
            .build()
            .map_err(|e| TransportError::Configuration {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint queries are sent to.
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn send(&self, payload: &QueryPayload) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(network_error)?;

        let status = StatusCode::new(response.status().as_u16()).ok_or_else(|| {
            TransportError::InvalidBody {
                message: format!("unrecognised status {}", response.status()),
            }
        })?;

        if !status.is_success() {
            let retry = retry_policy(status, response.headers().get(RETRY_AFTER));
            warn!(%status, ?retry, "GraphQL endpoint returned an error status");
            return Err(TransportError::Status { status, retry });
        }

        let headers = capture_headers(response.headers());
        let body = response.bytes().await.map_err(network_error)?;
        let json = serde_json::from_slice(&body).map_err(|e| TransportError::InvalidBody {
            message: e.to_string(),
        })?;
        debug!(%status, bytes = body.len(), "Response body decoded");

        Ok(TransportResponse {
            metadata: ResponseMetadata {
                status,
                headers,
                received_at: Timestamp::now(),
            },
            json,
        })
    }
}

fn default_headers(config: &HttpTransportConfig) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::Configuration {
                message: format!("invalid header name '{name}': {e}"),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| TransportError::Configuration {
            message: format!("invalid value for header '{name}': {e}"),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Header names are lower-cased by `reqwest`; non-UTF-8 values are skipped.
fn capture_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

/// `429` and `503` may be retried; everything else may not.
fn retry_policy(status: StatusCode, retry_after: Option<&HeaderValue>) -> RetryPolicy {
    match status.as_u16() {
        429 | 503 => RetryPolicy::Retryable {
            after: retry_after
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        _ => RetryPolicy::NonRetryable,
    }
}

fn network_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::Configuration {
            message: error.to_string(),
        }
    } else {
        TransportError::Network {
            message: error.to_string(),
        }
    }
}
