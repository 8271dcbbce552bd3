//! HTTP boundary in front of the repository rater.
//!
//! Exposes `GET /repositories/{org}?page={n}`. The caller's bearer token is
//! used to build a GitHub client for that request only; the server keeps no
//! credentials of its own.

mod error;

pub use error::ServerError;

use crate::config::{RatingPolicy, DEFAULT_CONCURRENCY};
use crate::fetcher::GitHubFetcher;
use crate::rater::RepositoryRater;
use crate::rating::RatedRepository;
use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Body returned when no bearer token is sent.
pub const MISSING_TOKEN_MESSAGE: &str = "GitHub token is required";

/// Produces rated pages for authenticated requests.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn rate_page(
        &self,
        token: &str,
        org: &str,
        page: u32,
    ) -> Result<Vec<RatedRepository>, ServerError>;
}

/// [`PageSource`] that rates repositories live against GitHub.
#[derive(Debug, Clone)]
pub struct GitHubPageSource {
    policy: RatingPolicy,
    concurrency: usize,
}

impl Default for GitHubPageSource {
    fn default() -> Self {
        Self::new(RatingPolicy::default(), DEFAULT_CONCURRENCY)
    }
}

impl GitHubPageSource {
    pub fn new(policy: RatingPolicy, concurrency: usize) -> Self {
        Self {
            policy,
            concurrency,
        }
    }
}

#[async_trait]
impl PageSource for GitHubPageSource {
    async fn rate_page(
        &self,
        token: &str,
        org: &str,
        page: u32,
    ) -> Result<Vec<RatedRepository>, ServerError> {
        let fetcher = GitHubFetcher::with_token(token)?;
        let rater = RepositoryRater::new(fetcher)
            .with_policy(self.policy.clone())
            .with_concurrency(self.concurrency);
        Ok(rater.rate_page(org, page).await?)
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "first_page")]
    page: u32,
}

fn first_page() -> u32 {
    1
}

/// Builds the application router.
pub fn router<P: PageSource>(source: P) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/repositories/:org", get(list_repositories::<P>))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(source))
}

/// Serves the router on `addr` until the process is stopped.
///
/// # Errors
///
/// Returns [`ServerError::Io`] if the address cannot be bound.
pub async fn serve<P: PageSource>(addr: SocketAddr, source: P) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Rating server listening");
    axum::serve(listener, router(source)).await?;
    Ok(())
}

async fn banner() -> &'static str {
    "GitHub Reporter server is running!"
}

async fn list_repositories<P: PageSource>(
    State(source): State<Arc<P>>,
    Path(org): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, MISSING_TOKEN_MESSAGE).into_response();
    };

    let page = query.page.max(1);
    match source.rate_page(token, &org, page).await {
        Ok(repositories) => Json(repositories).into_response(),
        Err(e) => {
            warn!(org = %org, page, error = %e, "Failed to rate page");
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.message()).into_response()
        }
    }
}

/// Extracts a non-empty bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
