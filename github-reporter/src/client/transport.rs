//! Network boundary between the page client and the rating server.

use super::ClientError;
use crate::rating::RatedRepository;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Request timeout for a single page. Rating a page fans out to many GitHub
/// calls on the server, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches one rated page from wherever the rater runs.
#[async_trait]
pub trait PageTransport: Send + Sync {
    /// Requests page `page` of `org`'s rated repositories.
    async fn fetch_page(
        &self,
        org: &str,
        token: &str,
        page: u32,
    ) -> Result<Vec<RatedRepository>, ClientError>;
}

/// [`PageTransport`] that calls `GET {base}/repositories/{org}?page={n}`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TransportFailed`] if the URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::TransportFailed {
            status: None,
            message: format!("Invalid server URL '{base_url}': {e}"),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("github-reporter/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::TransportFailed {
                status: None,
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    /// Builds the page URL for an organization, percent-encoding its name.
    fn repositories_url(&self, org: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::TransportFailed {
                status: None,
                message: format!("Server URL cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .push("repositories")
            .push(org);
        Ok(url)
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn fetch_page(
        &self,
        org: &str,
        token: &str,
        page: u32,
    ) -> Result<Vec<RatedRepository>, ClientError> {
        let url = self.repositories_url(org)?;
        debug!(url = %url, page, "Requesting rated page");

        let response = self
            .client
            .get(url)
            .query(&[("page", page)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::TransportFailed {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(ClientError::ListingFailed {
                status: Some(status.as_u16()),
                message,
            });
        }

        response
            .json::<Vec<RatedRepository>>()
            .await
            .map_err(|e| ClientError::TransportFailed {
                status: Some(status.as_u16()),
                message: format!("Invalid response body: {e}"),
            })
    }
}
