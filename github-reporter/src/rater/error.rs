//! Repository rater error types.

use thiserror::Error;

/// Errors that fail a whole page of ratings.
///
/// Per-criterion metadata failures never surface here; they only lower the
/// affected criterion's score.
#[derive(Debug, Error)]
pub enum RaterError {
    /// Listing the organization's repositories failed.
    #[error("Failed to list repositories: {message}")]
    ListingFailed {
        /// HTTP status GitHub answered with, if any.
        status: Option<u16>,
        /// Error message from GitHub.
        message: String,
    },
}

impl RaterError {
    /// Returns the HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ListingFailed { status, .. } => *status,
        }
    }
}
