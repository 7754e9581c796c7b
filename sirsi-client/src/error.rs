//! Error types for the SirsiDynix client

use thiserror::Error;

/// Errors that can occur while driving a catalog session
#[derive(Error, Debug)]
pub enum SirsiError {
    /// HTTP request failed (connection, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Invalid HTTP status {status} from {url}")]
    InvalidStatus {
        /// The status code that was received
        status: reqwest::StatusCode,
        /// The final URL of the failed request
        url: reqwest::Url,
    },

    /// Login was submitted but the catalog did not greet the patron
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An expected link or form is missing from the current page
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Page content did not have the expected structure
    #[error("Failed to parse {page} page: {detail}")]
    Parse {
        /// Logical page being parsed
        page: &'static str,
        /// What was missing or malformed
        detail: String,
    },

    /// A renewal target has no control on the renewal form
    #[error("No renewal control for item {token}")]
    FormField {
        /// Bare item token that could not be found
        token: String,
    },

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl SirsiError {
    /// Whether this error came from the network layer rather than page content
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidStatus { .. })
    }

    pub(crate) fn parse(page: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            page,
            detail: detail.into(),
        }
    }
}
