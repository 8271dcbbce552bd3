#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod cache;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod pager;
pub mod rater;
pub mod rating;
pub mod server;

pub use cache::{CacheEntry, CacheError, CacheKey, CacheStore, FileStore, MemoryStore};
pub use client::{
    ClientError, Clock, FetchedPage, HttpTransport, PageClient, PageTransport, SystemClock,
};
pub use config::{CacheSettings, ConfigError, RatingPolicy, ReporterConfig, ServerSettings};
pub use fetcher::{
    Branch, Comparison, FetchError, GitHubFetcher, MetadataFetcher, PullRequestSummary,
    RepositorySummary,
};
pub use pager::{PageState, PageTicket, Pager};
pub use rater::{RaterError, RepositoryRater, PAGE_SIZE};
pub use rating::{
    count_lines, count_old_pull_requests, is_stale, rate, rate_repository, RatedRepository,
    RatingCriteria, RatingCriterion, RepositoryMetadata,
};
pub use server::{router, serve, GitHubPageSource, PageSource, ServerError};
