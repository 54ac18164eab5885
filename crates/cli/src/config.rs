//! Transport configuration: an optional JSON file, overridden by flags and
//! the environment.

use std::path::Path;

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use transport_http::HttpTransportConfig;

use crate::args::Cli;

/// Builds the transport configuration for this invocation.
pub fn resolve(cli: &Cli) -> anyhow::Result<HttpTransportConfig> {
    let base = match &cli.config {
        Some(path) => load_file(path)?,
        None => Map::new(),
    };
    merge(base, cli)
}

fn load_file(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    match serde_json::from_str(&text)
        .with_context(|| format!("config file {} is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(map),
        other => bail!(
            "config file {} must contain a JSON object, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

fn merge(mut raw: Map<String, Value>, cli: &Cli) -> anyhow::Result<HttpTransportConfig> {
    if let Some(endpoint) = &cli.endpoint {
        raw.insert("endpoint".to_owned(), Value::from(endpoint.as_str()));
    }
    if let Some(timeout) = cli.timeout_secs {
        raw.insert("timeout_secs".to_owned(), Value::from(timeout));
    }
    if !raw.contains_key("endpoint") {
        bail!("no endpoint configured: pass --endpoint, set AUTOGRAPH_ENDPOINT, or add \"endpoint\" to the config file");
    }

    let mut config: HttpTransportConfig =
        serde_json::from_value(Value::Object(raw)).context("invalid transport configuration")?;

    for header in &cli.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header '{header}' must have the form NAME:VALUE");
        };
        config
            .headers
            .insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
    }
    Ok(config)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
