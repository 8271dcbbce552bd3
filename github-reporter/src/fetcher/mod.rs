//! Repository metadata retrieval from the GitHub REST API.
//!
//! This module is a pure I/O adapter: it lists an organization's
//! repositories and fetches the README, branches, commit comparisons and open
//! pull requests the rating engine scores. It makes no scoring decisions.

mod error;
mod models;

pub use error::FetchError;
pub use models::{Branch, Comparison, PullRequestSummary, RepositorySummary};

use async_trait::async_trait;
use octocrab::params::State;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Results per page when walking branches and pull requests.
const METADATA_PER_PAGE: u8 = 100;

/// Capability calls the repository rater needs from the hosting API.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Lists one page of an organization's repositories.
    async fn list_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<RepositorySummary>, FetchError>;

    /// Fetches the decoded README content.
    async fn get_readme(&self, repo: &RepositorySummary) -> Result<String, FetchError>;

    /// Lists every branch of the repository.
    async fn list_branches(&self, repo: &RepositorySummary) -> Result<Vec<Branch>, FetchError>;

    /// Fetches the head commit SHA of a branch.
    async fn get_branch_head(
        &self,
        repo: &RepositorySummary,
        branch: &str,
    ) -> Result<String, FetchError>;

    /// Compares `head` against `base`.
    async fn compare_commits(
        &self,
        repo: &RepositorySummary,
        base: &str,
        head: &str,
    ) -> Result<Comparison, FetchError>;

    /// Lists every open pull request of the repository.
    async fn list_open_pull_requests(
        &self,
        repo: &RepositorySummary,
    ) -> Result<Vec<PullRequestSummary>, FetchError>;
}

/// [`MetadataFetcher`] backed by an authenticated octocrab client.
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    octocrab: Octocrab,
}

impl GitHubFetcher {
    /// Wraps an authenticated GitHub client.
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Builds a fetcher authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub client cannot be constructed.
    pub fn with_token(token: &str) -> Result<Self, octocrab::Error> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;
        Ok(Self::new(octocrab))
    }
}

/// Builds an API route from raw path segments, percent-encoding each one.
///
/// Empty, `.` and `..` segments are rejected so caller-supplied names can
/// only ever address the intended endpoint.
fn api_route(segments: &[&str]) -> Result<String, FetchError> {
    if let Some(segment) = segments
        .iter()
        .find(|segment| matches!(**segment, "" | "." | ".."))
    {
        return Err(FetchError::Malformed {
            message: format!("Invalid path segment '{segment}'"),
        });
    }

    let mut url = Url::parse("https://api.github.com/").map_err(|e| FetchError::Malformed {
        message: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| FetchError::Malformed {
            message: "API root cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Query parameters for `GET /orgs/{org}/repos`.
#[derive(Serialize)]
struct ListReposParams {
    #[serde(rename = "type")]
    repo_type: &'static str,
    per_page: u8,
    page: u32,
}

#[derive(Deserialize)]
struct RepositoryPayload {
    id: u64,
    name: String,
    html_url: String,
    description: Option<String>,
    default_branch: Option<String>,
    owner: OwnerPayload,
}

#[derive(Deserialize)]
struct OwnerPayload {
    login: String,
}

#[derive(Deserialize)]
struct BranchPayload {
    commit: CommitPayload,
}

#[derive(Deserialize)]
struct CommitPayload {
    sha: String,
}

impl From<RepositoryPayload> for RepositorySummary {
    fn from(payload: RepositoryPayload) -> Self {
        Self {
            id: payload.id,
            owner: payload.owner.login,
            name: payload.name,
            html_url: payload.html_url,
            description: payload.description,
            default_branch: payload
                .default_branch
                .unwrap_or_else(|| "main".to_string()),
        }
    }
}

#[async_trait]
impl MetadataFetcher for GitHubFetcher {
    async fn list_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<RepositorySummary>, FetchError> {
        debug!(org, page, per_page, "Listing organization repositories");
        let params = ListReposParams {
            repo_type: "all",
            per_page,
            page,
        };
        let route = api_route(&["orgs", org, "repos"])?;
        let repos: Vec<RepositoryPayload> = self.octocrab.get(route, Some(&params)).await?;

        Ok(repos.into_iter().map(RepositorySummary::from).collect())
    }

    async fn get_readme(&self, repo: &RepositorySummary) -> Result<String, FetchError> {
        let readme = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .get_readme()
            .send()
            .await
            .map_err(|e| not_found_or_api(e, "README"))?;

        readme.decoded_content().ok_or_else(|| FetchError::Malformed {
            message: format!("README of {} could not be decoded", repo.full_name()),
        })
    }

    async fn list_branches(&self, repo: &RepositorySummary) -> Result<Vec<Branch>, FetchError> {
        let first = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .list_branches()
            .per_page(METADATA_PER_PAGE)
            .send()
            .await?;
        let branches = self.octocrab.all_pages(first).await?;

        Ok(branches
            .into_iter()
            .map(|branch| Branch {
                name: branch.name,
                head_sha: branch.commit.sha,
            })
            .collect())
    }

    async fn get_branch_head(
        &self,
        repo: &RepositorySummary,
        branch: &str,
    ) -> Result<String, FetchError> {
        // Branch names may contain '/', which GitHub expects unencoded.
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "branches"];
        segments.extend(branch.split('/'));
        let route = api_route(&segments)?;

        let payload: BranchPayload = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| not_found_or_api(e, "branch"))?;

        Ok(payload.commit.sha)
    }

    async fn compare_commits(
        &self,
        repo: &RepositorySummary,
        base: &str,
        head: &str,
    ) -> Result<Comparison, FetchError> {
        let range = format!("{base}...{head}");
        let route = api_route(&[
            "repos",
            repo.owner.as_str(),
            repo.name.as_str(),
            "compare",
            &range,
        ])?;
        let comparison: Comparison = self.octocrab.get(route, None::<&()>).await?;

        Ok(comparison)
    }

    async fn list_open_pull_requests(
        &self,
        repo: &RepositorySummary,
    ) -> Result<Vec<PullRequestSummary>, FetchError> {
        let first = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(State::Open)
            .per_page(METADATA_PER_PAGE)
            .send()
            .await?;
        let pulls = self.octocrab.all_pages(first).await?;

        Ok(pulls
            .into_iter()
            .map(|pr| PullRequestSummary {
                number: pr.number,
                created_at: pr.created_at,
            })
            .collect())
    }
}

/// Maps a 404 from GitHub to [`FetchError::NotFound`].
fn not_found_or_api(error: octocrab::Error, resource: &str) -> FetchError {
    let error = FetchError::from(error);
    if error.status() == Some(404) {
        FetchError::NotFound {
            resource: resource.to_string(),
        }
    } else {
        error
    }
}
