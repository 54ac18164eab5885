//! AutoGraph CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments** with `clap` and resolve the transport configuration
//!    from the config file, flags, and `AUTOGRAPH_ENDPOINT`.
//! 2. **Wire observability**: a JSON `tracing-subscriber` layer on stderr and,
//!    when configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: an [`transport_http::HttpTransport`]
//!    injected into a [`client::Client`].
//! 4. **Send one request** and print the mapped JSON on stdout.

mod args;
mod config;
mod observability;
mod request;

use std::process::ExitCode;

use anyhow::Context;
use binding::{
    CollectionUpdatePolicy, KeyPath, ObjectCollection, OperationName, RawQuery, SingleObject,
};
use clap::Parser;
use client::Client;
use serde_json::Value;
use tracing::error;
use transport_http::HttpTransport;

use crate::args::Cli;
use crate::request::JsonRequest;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match observability::init() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Request failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::resolve(&cli)?;
    let client = Client::new(HttpTransport::new(&config)?);

    let query = build_query(&cli)?;
    let key_path = KeyPath::new(cli.key_path.as_str());
    let policy = CollectionUpdatePolicy {
        unique: cli.unique,
        nullable: cli.nullable,
    };

    let output = if cli.collection {
        let request = JsonRequest::<ObjectCollection>::new(query, key_path, policy);
        Value::from(client.send_async(request).await?)
    } else {
        let request = JsonRequest::<SingleObject>::new(query, key_path, policy);
        client.send_async(request).await?
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

fn build_query(cli: &Cli) -> anyhow::Result<RawQuery> {
    let document = match cli.query.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {path}"))?,
        None => cli.query.clone(),
    };

    let mut query = RawQuery::new(document);
    if let Some(name) = cli.operation_name.as_deref().and_then(OperationName::new) {
        query = query.with_operation_name(name);
    }
    if let Some(variables) = &cli.variables {
        let variables: Value =
            serde_json::from_str(variables).context("--variables is not valid JSON")?;
        query = query.with_variables(variables)?;
    }
    Ok(query)
}
