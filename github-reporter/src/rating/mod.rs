//! Repository rating engine.
//!
//! Pure functions that turn fetched repository metadata into
//! [`RatingCriteria`]. Nothing here performs I/O; the rater supplies every
//! input, including the instant old pull requests are measured against.
//!
//! Each criterion fails closed on its own: a fetch error for one criterion
//! scores that criterion at its minimum and leaves the others untouched.

mod criteria;

pub use criteria::{RatedRepository, RatingCriteria, RatingCriterion, MAX_RATING};

use crate::config::RatingPolicy;
use crate::fetcher::{Comparison, FetchError, RepositorySummary};
use chrono::{DateTime, Utc};

/// Points available for having a description.
pub const DESCRIPTION_MAX_SCORE: u8 = 1;

/// Points available for the README.
pub const README_MAX_SCORE: u8 = 3;

/// Points available for keeping stale branches in check.
pub const STALE_BRANCHES_MAX_SCORE: u8 = 3;

/// Points available for keeping old pull requests in check.
pub const OLD_PULL_REQUESTS_MAX_SCORE: u8 = 3;

/// README score when one exists but is short.
const SHORT_README_SCORE: u8 = 1;

/// Fetched metadata for one repository, each piece either a count or the
/// error that prevented computing it.
#[derive(Debug)]
pub struct RepositoryMetadata {
    /// Line count of the README.
    pub readme_lines: Result<usize, FetchError>,

    /// Number of non-default branches identical to the default branch head.
    pub stale_branches: Result<usize, FetchError>,

    /// Number of open pull requests older than the policy's age threshold.
    pub old_pull_requests: Result<usize, FetchError>,
}

/// Scores a repository from its fetched metadata.
#[must_use]
pub fn rate(
    repo: &RepositorySummary,
    metadata: &RepositoryMetadata,
    policy: &RatingPolicy,
) -> RatingCriteria {
    RatingCriteria {
        description: rate_description(repo.description.as_deref()),
        readme: rate_readme(&metadata.readme_lines, policy),
        stale_branches: rate_stale_branches(&metadata.stale_branches, policy),
        old_pull_requests: rate_old_pull_requests(&metadata.old_pull_requests, policy),
    }
}

/// Rates a repository and attaches the result.
#[must_use]
pub fn rate_repository(
    repo: RepositorySummary,
    metadata: &RepositoryMetadata,
    policy: &RatingPolicy,
) -> RatedRepository {
    let criteria = rate(&repo, metadata, policy);
    RatedRepository::new(repo, criteria)
}

fn rate_description(description: Option<&str>) -> RatingCriterion {
    let score = match description {
        Some(text) if !text.is_empty() => DESCRIPTION_MAX_SCORE,
        _ => 0,
    };
    RatingCriterion::new(score, DESCRIPTION_MAX_SCORE)
}

fn rate_readme(lines: &Result<usize, FetchError>, policy: &RatingPolicy) -> RatingCriterion {
    let score = match lines {
        Ok(count) if *count > policy.readme_min_lines => README_MAX_SCORE,
        Ok(_) => SHORT_README_SCORE,
        Err(_) => 0,
    };
    RatingCriterion::new(score, README_MAX_SCORE)
}

fn rate_stale_branches(
    count: &Result<usize, FetchError>,
    policy: &RatingPolicy,
) -> RatingCriterion {
    match count {
        Ok(count) => {
            let score = if *count > policy.max_stale_branches {
                0
            } else {
                STALE_BRANCHES_MAX_SCORE
            };
            RatingCriterion::counted(score, STALE_BRANCHES_MAX_SCORE, *count)
        }
        Err(_) => RatingCriterion::counted(0, STALE_BRANCHES_MAX_SCORE, 0),
    }
}

fn rate_old_pull_requests(
    count: &Result<usize, FetchError>,
    policy: &RatingPolicy,
) -> RatingCriterion {
    match count {
        Ok(count) => {
            let score = if *count > policy.max_old_pull_requests {
                0
            } else {
                OLD_PULL_REQUESTS_MAX_SCORE
            };
            RatingCriterion::counted(score, OLD_PULL_REQUESTS_MAX_SCORE, *count)
        }
        Err(_) => RatingCriterion::counted(0, OLD_PULL_REQUESTS_MAX_SCORE, 0),
    }
}

/// Counts README lines as newline-separated segments, so a trailing newline
/// adds an empty final line.
#[must_use]
pub fn count_lines(content: &str) -> usize {
    content.split('\n').count()
}

/// A branch is stale when it is neither ahead of nor behind the default
/// branch head. Merely being merged is not enough.
#[must_use]
pub fn is_stale(comparison: &Comparison) -> bool {
    comparison.ahead_by == 0 && comparison.behind_by == 0
}

/// Counts pull requests created strictly before `now - policy age`.
///
/// Pull requests without a creation time are not counted.
#[must_use]
pub fn count_old_pull_requests<I>(
    created_at: I,
    now: DateTime<Utc>,
    policy: &RatingPolicy,
) -> usize
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    let cutoff = now - policy.old_pull_request_age();
    created_at
        .into_iter()
        .flatten()
        .filter(|created| *created < cutoff)
        .count()
}
