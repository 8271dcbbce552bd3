//! Scoring thresholds for the rating engine.

use serde::Deserialize;

/// Thresholds applied by the rating engine.
///
/// Defaults match the heuristics the reporter has always used: a README longer
/// than 100 lines, at most 5 stale branches, and at most 10 pull requests older
/// than 21 days.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RatingPolicy {
    /// README must have strictly more lines than this to get the full score.
    pub readme_min_lines: usize,

    /// More stale branches than this zeroes the stale-branch score.
    pub max_stale_branches: usize,

    /// Age in days after which an open pull request counts as old.
    pub old_pull_request_days: u32,

    /// More old pull requests than this zeroes the old-PR score.
    pub max_old_pull_requests: usize,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            readme_min_lines: 100,
            max_stale_branches: 5,
            old_pull_request_days: 21,
            max_old_pull_requests: 10,
        }
    }
}

impl RatingPolicy {
    /// Returns the age after which an open pull request counts as old.
    #[must_use]
    pub fn old_pull_request_age(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.old_pull_request_days))
    }
}
