//! Rates one page of an organization's repositories.
//!
//! For every listed repository this module fetches the README, branch
//! comparisons and open pull requests, then hands the results to the rating
//! engine. Repositories are processed as a bounded concurrent group whose
//! output keeps the listing order.

mod error;

pub use error::RaterError;

use crate::config::{RatingPolicy, DEFAULT_CONCURRENCY};
use crate::fetcher::{Comparison, FetchError, MetadataFetcher, RepositorySummary};
use crate::rating::{
    count_lines, count_old_pull_requests, is_stale, rate_repository, RatedRepository,
    RepositoryMetadata,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Number of repositories per page.
pub const PAGE_SIZE: usize = 10;

/// Orchestrates metadata fetching and rating over a page of repositories.
#[derive(Debug, Clone)]
pub struct RepositoryRater<F> {
    fetcher: F,
    policy: RatingPolicy,
    concurrency: usize,
}

impl<F: MetadataFetcher> RepositoryRater<F> {
    /// Creates a rater with the default policy and concurrency.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            policy: RatingPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the scoring thresholds.
    pub fn with_policy(mut self, policy: RatingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many repositories (and branch comparisons) are in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the scoring thresholds.
    pub fn policy(&self) -> &RatingPolicy {
        &self.policy
    }

    /// Lists and rates one page of an organization's repositories.
    ///
    /// # Errors
    ///
    /// Returns [`RaterError::ListingFailed`] if the repository listing fails.
    /// Metadata failures for individual repositories only lower their scores.
    pub async fn rate_page(
        &self,
        org: &str,
        page: u32,
    ) -> Result<Vec<RatedRepository>, RaterError> {
        let span = info_span!("rate_page", org = %org, page);

        async {
            info!("Rating repositories");

            let repositories = self
                .fetcher
                .list_repositories(org, page, PAGE_SIZE as u8)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to list repositories");
                    RaterError::ListingFailed {
                        status: e.status(),
                        message: e.message(),
                    }
                })?;

            // Old pull requests are measured against one instant per page.
            let now = Utc::now();
            let rated: Vec<RatedRepository> = stream::iter(repositories)
                .map(move |repo| self.rate_one(repo, now))
                .buffered(self.concurrency)
                .collect()
                .await;

            info!(count = rated.len(), "Rated page");
            Ok(rated)
        }
        .instrument(span)
        .await
    }

    /// Fetches metadata for one repository and rates it.
    async fn rate_one(&self, repo: RepositorySummary, now: DateTime<Utc>) -> RatedRepository {
        let full_name = repo.full_name();

        async {
            let (readme_lines, stale_branches, old_pull_requests) = futures::join!(
                self.readme_lines(&repo),
                self.stale_branch_count(&repo),
                self.old_pull_request_count(&repo, now),
            );

            log_failure("readme", &readme_lines);
            log_failure("stale_branches", &stale_branches);
            log_failure("old_pull_requests", &old_pull_requests);

            let metadata = RepositoryMetadata {
                readme_lines,
                stale_branches,
                old_pull_requests,
            };
            let rated = rate_repository(repo, &metadata, &self.policy);
            debug!(rating = rated.rating(), "Rated repository");
            rated
        }
        .instrument(info_span!("rate_repository", repo = %full_name))
        .await
    }

    async fn readme_lines(&self, repo: &RepositorySummary) -> Result<usize, FetchError> {
        let content = self.fetcher.get_readme(repo).await?;
        Ok(count_lines(&content))
    }

    /// Counts non-default branches whose history matches the default branch head.
    ///
    /// Any failed call fails the whole count.
    async fn stale_branch_count(&self, repo: &RepositorySummary) -> Result<usize, FetchError> {
        let branches = self.fetcher.list_branches(repo).await?;
        let base = self
            .fetcher
            .get_branch_head(repo, &repo.default_branch)
            .await?;

        let heads: Vec<String> = branches
            .into_iter()
            .filter(|branch| branch.name != repo.default_branch)
            .map(|branch| branch.head_sha)
            .collect();

        let base = base.as_str();
        let comparisons: Vec<_> = stream::iter(heads)
            .map(move |head| self.compare_head(repo, base, head))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut stale = 0;
        for comparison in comparisons {
            if is_stale(&comparison?) {
                stale += 1;
            }
        }
        Ok(stale)
    }

    async fn compare_head(
        &self,
        repo: &RepositorySummary,
        base: &str,
        head: String,
    ) -> Result<Comparison, FetchError> {
        self.fetcher.compare_commits(repo, base, &head).await
    }

    async fn old_pull_request_count(
        &self,
        repo: &RepositorySummary,
        now: DateTime<Utc>,
    ) -> Result<usize, FetchError> {
        let pulls = self.fetcher.list_open_pull_requests(repo).await?;
        Ok(count_old_pull_requests(
            pulls.into_iter().map(|pr| pr.created_at),
            now,
            &self.policy,
        ))
    }
}

fn log_failure(criterion: &str, result: &Result<usize, FetchError>) {
    match result {
        Err(FetchError::NotFound { resource }) => {
            debug!(criterion, resource = %resource, "Metadata not found, scoring as zero");
        }
        Err(e) => {
            warn!(criterion, error = %e, "Metadata fetch failed, scoring as zero");
        }
        Ok(_) => {}
    }
}
