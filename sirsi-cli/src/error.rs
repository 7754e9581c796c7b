//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Main CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file is not valid JSON
    #[error("Invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Catalog client error
    #[error("{0}")]
    Client(#[from] sirsi_client::SirsiError),

    /// Requested tokens are not among the checked-out items
    #[error("Not checked out: {}", .0.join(", "))]
    UnknownTokens(Vec<String>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
