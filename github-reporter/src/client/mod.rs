//! Pagination cache client.
//!
//! Requests rated pages from the rating server and caches them per
//! `(organization, page)`. A fresh cache entry is served without touching the
//! network; when the network fails, any cached entry for the page is served
//! instead, however old.

mod clock;
mod error;
mod transport;

pub use clock::{Clock, SystemClock};
pub use error::ClientError;
pub use transport::{HttpTransport, PageTransport};

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::config::DEFAULT_CACHE_EXPIRY_SECS;
use crate::rating::RatedRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// A page of rated repositories and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Rated repositories in listing order.
    pub data: Vec<RatedRepository>,

    /// True if the page was served from the cache rather than the network.
    pub from_cache: bool,
}

/// Serves rated pages from the cache or the network.
pub struct PageClient<T, S> {
    transport: T,
    store: S,
    expiry: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: PageTransport, S: CacheStore> PageClient<T, S> {
    /// Creates a client with the default one-hour freshness window.
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            expiry: Duration::from_secs(DEFAULT_CACHE_EXPIRY_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets how long a cached page stays fresh.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Replaces the clock used for cache timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns one page of `org`'s rated repositories.
    ///
    /// Unless `force_refresh` is set, a fresh cache entry is returned without a
    /// network call. A successful network fetch overwrites the cache entry. On
    /// network failure, any cache entry for the page is returned with
    /// `from_cache` set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CredentialMissing`] for an empty token, before
    /// any lookup. Otherwise returns the network error when no cache entry
    /// exists for the page.
    pub async fn fetch_page(
        &self,
        org: &str,
        token: &str,
        page: u32,
        force_refresh: bool,
    ) -> Result<FetchedPage, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::CredentialMissing);
        }

        let key = CacheKey::new(org, page);
        let span = info_span!("fetch_page", key = %key, force_refresh);

        async {
            if !force_refresh {
                if let Some(entry) = self.store.get(&key) {
                    if entry.is_fresh(self.clock.now_millis(), self.expiry) {
                        debug!("Serving fresh cache entry");
                        return Ok(FetchedPage {
                            data: entry.data,
                            from_cache: true,
                        });
                    }
                    debug!("Cache entry expired");
                }
            }

            match self.transport.fetch_page(org, token, page).await {
                Ok(data) => {
                    let entry = CacheEntry::new(self.clock.now_millis(), data.clone());
                    if let Err(e) = self.store.set(&key, entry) {
                        warn!(error = %e, "Failed to cache page");
                    }
                    info!(count = data.len(), "Fetched page");
                    Ok(FetchedPage {
                        data,
                        from_cache: false,
                    })
                }
                Err(e) => match self.store.get(&key) {
                    Some(entry) => {
                        warn!(error = %e, "Fetch failed, serving cached page");
                        Ok(FetchedPage {
                            data: entry.data,
                            from_cache: true,
                        })
                    }
                    None => {
                        warn!(error = %e, "Fetch failed and no cached page exists");
                        Err(e)
                    }
                },
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::fetcher::RepositorySummary;
    use crate::rating::{RatingCriteria, RatingCriterion};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    pub(crate) fn rated(name: &str) -> RatedRepository {
        RatedRepository::new(
            RepositorySummary {
                id: 1,
                owner: "acme".to_string(),
                name: name.to_string(),
                html_url: format!("https://github.com/acme/{name}"),
                description: None,
                default_branch: "main".to_string(),
            },
            RatingCriteria {
                description: RatingCriterion::new(0, 1),
                readme: RatingCriterion::new(3, 3),
                stale_branches: RatingCriterion::counted(3, 3, 0),
                old_pull_requests: RatingCriterion::counted(3, 3, 0),
            },
        )
    }

    pub(crate) fn page_of(prefix: &str, count: usize) -> Vec<RatedRepository> {
        (0..count).map(|i| rated(&format!("{prefix}-{i}"))).collect()
    }

    /// Transport that serves scripted pages and counts calls.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub pages: Mutex<Vec<Vec<RatedRepository>>>,
        pub failing: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl FakeTransport {
        pub(crate) fn serving(pages: Vec<Vec<RatedRepository>>) -> Self {
            Self {
                pages: Mutex::new(pages),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PageTransport for FakeTransport {
        async fn fetch_page(
            &self,
            _org: &str,
            _token: &str,
            page: u32,
        ) -> Result<Vec<RatedRepository>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError::TransportFailed {
                    status: None,
                    message: "connection refused".to_string(),
                });
            }
            let pages = self.pages.lock().unwrap();
            Ok(pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }
    }

    pub(crate) struct FixedClock(pub AtomicI64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn client(
        transport: FakeTransport,
        now: i64,
    ) -> (PageClient<FakeTransport, MemoryStore>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock(AtomicI64::new(now)));
        let client = PageClient::new(transport, MemoryStore::new()).with_clock(clock.clone());
        (client, clock)
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_network() {
        let (client, _) = client(FakeTransport::serving(vec![page_of("a", 1)]), 0);

        let result = client.fetch_page("acme", "", 1, false).await;
        assert_eq!(result, Err(ClientError::CredentialMissing));
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fresh_cache_avoids_second_call() {
        let (client, clock) = client(FakeTransport::serving(vec![page_of("a", 3)]), 1_000);

        let first = client.fetch_page("acme", "token", 1, false).await.unwrap();
        clock.0.store(1_000 + HOUR_MS - 1, Ordering::SeqCst);
        let second = client.fetch_page("acme", "token", 1, false).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.data, second.data);
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_is_refetched() {
        let (client, clock) = client(FakeTransport::serving(vec![page_of("a", 3)]), 1_000);

        client.fetch_page("acme", "token", 1, false).await.unwrap();
        clock.0.store(1_000 + HOUR_MS, Ordering::SeqCst);
        let again = client.fetch_page("acme", "token", 1, false).await.unwrap();

        assert!(!again.from_cache);
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn forced_refresh_overwrites_timestamp() {
        let (client, clock) = client(FakeTransport::serving(vec![page_of("a", 3)]), 1_000);

        client.fetch_page("acme", "token", 1, false).await.unwrap();
        clock.0.store(5_000, Ordering::SeqCst);
        let refreshed = client.fetch_page("acme", "token", 1, true).await.unwrap();

        assert!(!refreshed.from_cache);
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 2);
        let entry = client.store().get(&CacheKey::new("acme", 1)).unwrap();
        assert_eq!(entry.timestamp, 5_000);
    }

    #[tokio::test]
    async fn stale_cache_is_served_when_network_fails() {
        let (client, clock) = client(FakeTransport::serving(vec![page_of("a", 2)]), 0);

        let original = client.fetch_page("acme", "token", 1, false).await.unwrap();
        clock.0.store(3 * HOUR_MS, Ordering::SeqCst);
        client.transport.failing.store(true, Ordering::SeqCst);

        let fallback = client.fetch_page("acme", "token", 1, false).await.unwrap();
        assert!(fallback.from_cache);
        assert_eq!(fallback.data, original.data);

        let forced = client.fetch_page("acme", "token", 1, true).await.unwrap();
        assert!(forced.from_cache);
    }

    #[tokio::test]
    async fn network_failure_without_cache_propagates() {
        let transport = FakeTransport::default();
        transport.failing.store(true, Ordering::SeqCst);
        let (client, _) = client(transport, 0);

        let result = client.fetch_page("acme", "token", 1, false).await;
        assert!(matches!(result, Err(ClientError::TransportFailed { .. })));
    }

    #[tokio::test]
    async fn organizations_are_cached_case_sensitively() {
        let (client, _) = client(FakeTransport::serving(vec![page_of("a", 1)]), 0);

        client.fetch_page("Acme", "token", 1, false).await.unwrap();
        let other = client.fetch_page("acme", "token", 1, false).await.unwrap();

        assert!(!other.from_cache);
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 2);
    }
}
