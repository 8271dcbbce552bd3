//! Page client error types.

use thiserror::Error;

/// Errors surfaced to the presentation layer when a page cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No token was supplied; nothing was sent.
    #[error("GitHub token is required")]
    CredentialMissing,

    /// The rating server answered with a non-success status.
    #[error("{message}")]
    ListingFailed {
        /// HTTP status of the response.
        status: Option<u16>,
        /// Response body, verbatim.
        message: String,
    },

    /// The rating server could not be reached or sent an unreadable body.
    #[error("{message}")]
    TransportFailed {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },
}

impl ClientError {
    /// Returns the HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::CredentialMissing => None,
            Self::ListingFailed { status, .. } | Self::TransportFailed { status, .. } => *status,
        }
    }
}
