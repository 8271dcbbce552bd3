//! Repository snapshots returned by the metadata fetcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as listed for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// GitHub repository ID.
    pub id: u64,

    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// Repository web URL.
    pub html_url: String,

    /// Repository description, if set.
    pub description: Option<String>,

    /// Default branch name (e.g., "main").
    pub default_branch: String,
}

impl RepositorySummary {
    /// Returns the full repository name in "owner/name" format.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub head_sha: String,
}

/// Result of comparing two commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Comparison {
    /// Commits `head` has that `base` does not.
    pub ahead_by: u64,

    /// Commits `base` has that `head` does not.
    pub behind_by: u64,
}

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub created_at: Option<DateTime<Utc>>,
}
