//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Send a GraphQL query and print the mapped result as JSON.
#[derive(Debug, Parser)]
#[command(name = "autograph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GraphQL endpoint URL. Overrides the config file.
    #[arg(short, long, env = "AUTOGRAPH_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Query document, or `@FILE` to read it from a file.
    #[arg(short, long, value_name = "DOCUMENT")]
    pub query: String,

    /// Operation to execute when the document defines several.
    #[arg(long, value_name = "NAME")]
    pub operation_name: Option<String>,

    /// Query variables as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub variables: Option<String>,

    /// Dotted path of the node to map, e.g. `data.allFilms.films`.
    #[arg(short, long, default_value = "data", value_name = "PATH")]
    pub key_path: String,

    /// Map the node as an array, one object per element.
    #[arg(long)]
    pub collection: bool,

    /// Drop duplicate elements from a collection.
    #[arg(long, requires = "collection")]
    pub unique: bool,

    /// Treat a null or missing collection as empty.
    #[arg(long, requires = "collection")]
    pub nullable: bool,

    /// JSON transport configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra request header. May be repeated.
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Request timeout in seconds. Overrides the config file.
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Pretty-print the output.
    #[arg(long)]
    pub pretty: bool,
}
