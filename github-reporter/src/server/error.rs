//! Rating server error types.

use crate::rater::RaterError;
use thiserror::Error;

/// Errors that can occur while serving rated pages.
#[derive(Debug, Error)]
pub enum ServerError {
    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Rating a page failed.
    #[error(transparent)]
    Rater(#[from] RaterError),

    /// Failed to bind or serve the listener.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status to answer with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Rater(e) => e.status().unwrap_or(502),
            Self::Octocrab(_) | Self::Io(_) => 500,
        }
    }

    /// Text body to answer with.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Rater(RaterError::ListingFailed { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}
