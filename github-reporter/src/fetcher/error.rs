//! Metadata fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching repository metadata.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The requested resource does not exist (e.g. a repository without a README).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// The API answered with data we could not use.
    #[error("Malformed response: {message}")]
    Malformed { message: String },
}

impl FetchError {
    /// Returns the HTTP status GitHub answered with, if known.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api(octocrab::Error::GitHub { source, .. }) => Some(source.status_code.as_u16()),
            Self::Api(_) | Self::Malformed { .. } => None,
        }
    }

    /// Returns the message GitHub answered with, falling back to the error text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(octocrab::Error::GitHub { source, .. }) => source.message.clone(),
            other => other.to_string(),
        }
    }
}
