//! Shared value types for the binding domain.
//!
//! These carry values with invariants (status codes are valid HTTP codes) or
//! decode well-known parts of a GraphQL response that are independent of any
//! particular request's mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Transport status
// ---------------------------------------------------------------------------

/// An HTTP status code in the range `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatusCode(u16);

impl StatusCode {
    /// Creates a [`StatusCode`], returning `None` outside `100..=599`.
    #[must_use]
    pub fn new(code: u16) -> Option<Self> {
        if (100..=599).contains(&code) {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Returns the raw status code.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns `true` for `2xx` codes.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GraphQL response errors
// ---------------------------------------------------------------------------

/// Position of an error inside the GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

/// One entry of the top-level `errors` array of a GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human-readable description from the server.
    pub message: String,

    /// Document positions the error refers to.
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,

    /// Response path (field names and list indices) of the failing field.
    #[serde(default)]
    pub path: Vec<Value>,
}

impl GraphQlError {
    /// Extracts the top-level `errors` array from a response payload.
    ///
    /// Returns an empty vector when the key is absent, `null`, or empty.
    /// Entries that do not decode keep their raw JSON text as the message.
    pub fn from_response(json: &Value) -> Vec<GraphQlError> {
        let Some(entries) = json.get("errors").and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .map(|entry| {
                serde_json::from_value(entry.clone()).unwrap_or_else(|_| GraphQlError {
                    message: entry.to_string(),
                    locations: Vec::new(),
                    path: Vec::new(),
                })
            })
            .collect()
    }
}

impl std::fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(loc) = self.locations.first() {
            write!(f, " (line {}, column {})", loc.line, loc.column)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_code_range() {
        assert!(StatusCode::new(99).is_none());
        assert!(StatusCode::new(600).is_none());
        assert!(StatusCode::new(204).unwrap().is_success());
        assert!(!StatusCode::new(429).unwrap().is_success());
    }

    #[test]
    fn test_graphql_errors_decoded_from_response() {
        let json = json!({
            "data": null,
            "errors": [
                { "message": "Cannot query field \"nme\"", "locations": [{ "line": 1, "column": 9 }] },
                { "message": "second", "path": ["person", 0, "name"] }
            ]
        });

        let errors = GraphQlError::from_response(&json);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].locations[0], ErrorLocation { line: 1, column: 9 });
        assert_eq!(errors[1].path, vec![json!("person"), json!(0), json!("name")]);
        assert_eq!(errors[0].to_string(), "Cannot query field \"nme\" (line 1, column 9)");
    }

    #[test]
    fn test_graphql_errors_absent() {
        assert!(GraphQlError::from_response(&json!({ "data": {} })).is_empty());
        assert!(GraphQlError::from_response(&json!({ "errors": null })).is_empty());
    }

    #[test]
    fn test_undecodable_error_entry_keeps_raw_text() {
        let errors = GraphQlError::from_response(&json!({ "errors": ["boom"] }));
        assert_eq!(errors[0].message, "\"boom\"");
    }
}
