//! Settings for [`crate::HttpTransport`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("autograph/", env!("CARGO_PKG_VERSION"));

/// HTTP transport configuration.
///
/// Every field except `endpoint` has a default, so a minimal config file is
/// `{ "endpoint": "https://example.com/graphql" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// GraphQL endpoint URL. Queries are `POST`ed here.
    pub endpoint: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra headers sent with every request (e.g. `authorization`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// `User-Agent` header value. Defaults to [`DEFAULT_USER_AGENT`].
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpTransportConfig {
    /// Creates a config for `endpoint` with default settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
            user_agent: default_user_agent(),
        }
    }

    /// The whole-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: HttpTransportConfig =
            serde_json::from_str(r#"{ "endpoint": "https://swapi.example/graphql" }"#).unwrap();

        assert_eq!(config, HttpTransportConfig::new("https://swapi.example/graphql"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("autograph/"));
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let config: HttpTransportConfig = serde_json::from_str(
            r#"{
                "endpoint": "http://localhost:4000",
                "timeout_secs": 5,
                "headers": { "authorization": "Bearer abc" },
                "user_agent": "films-app/2.1"
            }"#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.headers["authorization"], "Bearer abc");
        assert_eq!(config.user_agent, "films-app/2.1");
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        assert!(serde_json::from_str::<HttpTransportConfig>("{}").is_err());
    }
}
