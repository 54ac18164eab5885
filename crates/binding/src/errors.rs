//! Error and retry-policy types for the request binding domain.
//!
//! [`RequestError`] is what a completion callback receives in the failure arm
//! of a [`crate::MappingResult`]; each variant names the lifecycle stage that
//! failed. The stage-local errors ([`MappingError`], [`TransportError`],
//! [`ThreadAdapterError`], [`QueryError`]) are produced by the port
//! implementations and wrapped into [`RequestError`] by the client.
//!
//! [`RetryPolicy`] is informational only. The binding core never retries;
//! callers or transports may act on it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GraphQlError, StatusCode};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// ## Rules
///
/// - `Retryable` errors: network failures, timeouts, `429` and `503` responses.
/// - `NonRetryable` errors: configuration errors, hook rejections, mapping
///   failures, GraphQL validation errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, typically from a
        /// `Retry-After` header. `None` means apply the caller's own schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Stage-local errors
// ---------------------------------------------------------------------------

/// Failure raised by a [`crate::ThreadAdapter`] while moving mapped objects
/// between execution contexts.
#[derive(Debug, Error)]
pub enum ThreadAdapterError {
    /// The adapter cannot produce a sendable representation of an object.
    #[error("Object cannot be made thread safe: {message}")]
    Unrepresentable {
        /// Description of the offending object.
        message: String,
    },

    /// A representation no longer resolves to a live object in the
    /// destination context (e.g. the backing record was deleted).
    #[error("Object could not be retrieved on the destination context: {message}")]
    Unresolvable {
        /// Description of the missing object.
        message: String,
    },

    /// The adapter returned a different number of items than it was given.
    #[error("Thread adapter returned {actual} objects, expected {expected}")]
    CountMismatch {
        /// Number of objects handed to the adapter.
        expected: usize,
        /// Number of objects the adapter returned.
        actual: usize,
    },
}

/// Failure converting a response payload into typed objects.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The key path of the binding does not exist in the payload.
    #[error("Key path '{key_path}' not found in response")]
    MissingKeyPath {
        /// The key path that failed to resolve.
        key_path: String,
    },

    /// A collection binding resolved to something other than a JSON array.
    #[error("Expected an array at '{key_path}', found {found}")]
    NotACollection {
        /// The key path of the collection binding.
        key_path: String,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// One element of a collection failed to map; the whole collection fails.
    #[error("Element {index} failed to map: {source}")]
    Element {
        /// Position of the element in the payload array.
        index: usize,
        /// The element's own mapping failure.
        #[source]
        source: Box<MappingError>,
    },

    /// The node could not be deserialised into the target type.
    #[error("Payload could not be deserialised: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A hand-written mapping rejected the node.
    #[error("Invalid payload: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },

    /// Thread adaptation failed. Treated identically to a mapping failure.
    #[error(transparent)]
    ThreadAdapter(#[from] ThreadAdapterError),

    /// The background mapping task did not complete (panicked or was cancelled).
    #[error("Mapping task aborted: {message}")]
    Aborted {
        /// Description from the task runtime.
        message: String,
    },
}

/// Failure raised by a [`crate::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("Server responded with status {status}")]
    Status {
        /// The status code returned.
        status: StatusCode,
        /// Whether the caller may retry, derived from status and headers.
        retry: RetryPolicy,
    },

    /// Connection, TLS, or timeout failure before a response was received.
    #[error("Network failure: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("Response body is not valid JSON: {message}")]
    InvalidBody {
        /// Description of the decode failure.
        message: String,
    },

    /// The transport itself is misconfigured (bad endpoint, bad header).
    #[error("Transport configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl TransportError {
    /// Returns whether this failure may be retried.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            TransportError::Status { retry, .. } => retry.clone(),
            TransportError::Network { .. } => RetryPolicy::Retryable { after: None },
            TransportError::InvalidBody { .. } | TransportError::Configuration { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

/// Failure producing the wire representation of a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query document is empty.
    #[error("Query document is empty")]
    EmptyDocument,

    /// The query could not be rendered.
    #[error("Query could not be serialised: {message}")]
    Serialization {
        /// Description of the problem.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Request-level errors
// ---------------------------------------------------------------------------

/// Failure delivered to a request's `did_finish` hook and completion callback.
///
/// Each variant corresponds to one stage of the request lifecycle:
///
/// | Variant | Stage | Mapping attempted |
/// |---------|-------|-------------------|
/// | `Configuration` | binding validation, before `will_send` | no |
/// | `PreSend` | `will_send` | no |
/// | `Query` | query serialisation | no |
/// | `Transport` | transport `send` | no |
/// | `PostTransport` | `did_finish_request` | no |
/// | `GraphQl` | response `errors` check | no |
/// | `Mapping` | mapping or thread adaptation | yes |
/// | `PostMappingHook` | `did_finish` (reported only, never delivered) | yes |
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request is misconfigured. Programmer error; never retried.
    ///
    /// Produced when a thread-confined object type is requested without a
    /// thread adapter.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// `will_send` rejected the request; nothing was sent.
    #[error("Request rejected before sending: {source}")]
    PreSend {
        /// Error returned by the hook.
        #[source]
        source: anyhow::Error,
    },

    /// The query could not be serialised; nothing was sent.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The transport failed to deliver the query or receive a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `did_finish_request` rejected the response; mapping was skipped.
    #[error("Response rejected before mapping: {source}")]
    PostTransport {
        /// Error returned by the hook.
        #[source]
        source: anyhow::Error,
    },

    /// The server returned GraphQL errors; mapping was skipped.
    #[error("GraphQL request failed with {} error(s): {}", .errors.len(), first_message(.errors))]
    GraphQl {
        /// Errors from the response's top-level `errors` array.
        errors: Vec<GraphQlError>,
    },

    /// Mapping or thread adaptation failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// `did_finish` failed. Reported alongside the delivered result; it never
    /// replaces it.
    #[error("did_finish hook failed: {source}")]
    PostMappingHook {
        /// Error returned by the hook.
        #[source]
        source: anyhow::Error,
    },
}

impl RequestError {
    /// Returns whether the failed request may be re-sent as-is.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            RequestError::Transport(e) => e.retry_policy(),
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` if the failure happened before any mapping work started.
    pub fn is_pre_mapping(&self) -> bool {
        !matches!(
            self,
            RequestError::Mapping(_) | RequestError::PostMappingHook { .. }
        )
    }
}

fn first_message(errors: &[GraphQlError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}
