//! Transport port: delivering a query and returning the raw response.
//!
//! Implementations own connection handling, timeouts, and authentication.
//! Retries are not performed by the client; implementations may retry
//! internally and should report [`crate::RetryPolicy`] through
//! [`TransportError`] otherwise.

use async_trait::async_trait;
use serde_json::Value;

use crate::{QueryPayload, StatusCode, Timestamp, TransportError};

/// Response details handed to `did_finish_request` alongside the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    /// Response status.
    pub status: StatusCode,
    /// Response headers, names lower-cased, in arrival order.
    pub headers: Vec<(String, String)>,
    /// When the response finished arriving.
    pub received_at: Timestamp,
}

impl ResponseMetadata {
    /// Creates metadata for a response that arrived now with no headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            received_at: Timestamp::now(),
        }
    }

    /// Returns the first value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A successfully received response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// Status, headers, and arrival time.
    pub metadata: ResponseMetadata,
    /// The decoded JSON body.
    pub json: Value,
}

/// Sends GraphQL payloads to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `payload` and returns the decoded response.
    ///
    /// A non-success status is an error; GraphQL-level `errors` in a
    /// successful response are not.
    async fn send(&self, payload: &QueryPayload) -> Result<TransportResponse, TransportError>;
}
