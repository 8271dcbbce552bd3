//! Page accumulation for the presentation layer.
//!
//! [`PageState`] holds the repositories loaded so far. Loading page 1 replaces
//! them, loading a later page appends. Every load is tagged with a
//! [`PageTicket`]; only the most recently issued ticket may apply its result,
//! so a slow response that was superseded by a refresh is dropped.
//!
//! [`Pager`] drives a [`PageClient`] through that state for one organization.

use crate::cache::CacheStore;
use crate::client::{ClientError, PageClient, PageTransport};
use crate::rater::PAGE_SIZE;
use crate::rating::RatedRepository;
use tracing::debug;

/// Identifies one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    page: u32,
    generation: u64,
}

impl PageTicket {
    /// Page this load requested.
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Repositories accumulated across loaded pages.
#[derive(Debug, Clone)]
pub struct PageState {
    page: u32,
    repositories: Vec<RatedRepository>,
    has_more: bool,
    generation: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 0,
            repositories: Vec::new(),
            has_more: true,
            generation: 0,
        }
    }
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last page applied, or 0 before any load.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// All accumulated repositories, page-ascending.
    pub fn repositories(&self) -> &[RatedRepository] {
        &self.repositories
    }

    /// Page a load-more request should ask for.
    pub fn next_page(&self) -> u32 {
        self.page + 1
    }

    /// Issues a ticket for loading `page`, superseding every earlier ticket.
    pub fn begin(&mut self, page: u32) -> PageTicket {
        self.generation += 1;
        PageTicket {
            page,
            generation: self.generation,
        }
    }

    /// Applies a loaded page. Returns false, changing nothing, if a newer
    /// ticket has been issued since.
    pub fn apply(&mut self, ticket: PageTicket, data: Vec<RatedRepository>) -> bool {
        if ticket.generation != self.generation {
            debug!(page = ticket.page, "Discarding superseded page");
            return false;
        }

        self.has_more = data.len() >= PAGE_SIZE;
        if ticket.page <= 1 {
            self.repositories = data;
        } else {
            self.repositories.extend(data);
        }
        self.page = ticket.page;
        true
    }

    /// Repositories whose name contains `term`, ignoring case.
    pub fn filtered(&self, term: &str) -> Vec<&RatedRepository> {
        let term = term.to_lowercase();
        self.repositories
            .iter()
            .filter(|repo| repo.name().to_lowercase().contains(&term))
            .collect()
    }
}

/// Loads pages of one organization through a [`PageClient`].
pub struct Pager<T, S> {
    client: PageClient<T, S>,
    organization: String,
    token: String,
    state: PageState,
}

impl<T: PageTransport, S: CacheStore> Pager<T, S> {
    pub fn new(client: PageClient<T, S>, organization: String, token: String) -> Self {
        Self {
            client,
            organization,
            token,
            state: PageState::new(),
        }
    }

    /// Current accumulated state.
    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Loads page 1, replacing anything accumulated. Returns whether the page
    /// came from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the page can be served neither from the
    /// network nor from the cache.
    pub async fn load_first(&mut self, force_refresh: bool) -> Result<bool, ClientError> {
        self.load(1, force_refresh).await
    }

    /// Forces a network fetch of page 1 and resets accumulation to it.
    ///
    /// # Errors
    ///
    /// See [`Pager::load_first`].
    pub async fn refresh(&mut self) -> Result<bool, ClientError> {
        self.load(1, true).await
    }

    /// Loads the page after the last one applied.
    ///
    /// Returns `Ok(None)` without a request once no more pages exist.
    ///
    /// # Errors
    ///
    /// See [`Pager::load_first`].
    pub async fn load_more(&mut self) -> Result<Option<bool>, ClientError> {
        if !self.state.has_more() {
            return Ok(None);
        }
        let page = self.state.next_page();
        self.load(page, false).await.map(Some)
    }

    async fn load(&mut self, page: u32, force_refresh: bool) -> Result<bool, ClientError> {
        let ticket = self.state.begin(page);
        let fetched = self
            .client
            .fetch_page(&self.organization, &self.token, page, force_refresh)
            .await?;
        self.state.apply(ticket, fetched.data);
        Ok(fetched.from_cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::client::tests::{page_of, FakeTransport};

    #[test]
    fn first_page_replaces_and_later_pages_append() {
        let mut state = PageState::new();

        let ticket = state.begin(1);
        assert!(state.apply(ticket, page_of("one", 10)));
        assert!(state.has_more());

        let ticket = state.begin(2);
        assert!(state.apply(ticket, page_of("two", 4)));
        assert_eq!(state.repositories().len(), 14);
        assert!(!state.has_more());
        assert_eq!(state.repositories()[10].name(), "two-0");

        let ticket = state.begin(1);
        assert!(state.apply(ticket, page_of("fresh", 10)));
        assert_eq!(state.repositories().len(), 10);
        assert!(state.has_more());
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut state = PageState::new();
        let first = state.begin(1);
        state.apply(first, page_of("one", 10));

        let slow = state.begin(2);
        let refresh = state.begin(1);
        assert!(state.apply(refresh, page_of("refreshed", 10)));
        assert!(!state.apply(slow, page_of("late", 3)));

        assert_eq!(state.repositories().len(), 10);
        assert_eq!(state.repositories()[0].name(), "refreshed-0");
        assert!(state.has_more());
    }

    #[test]
    fn filters_by_name_ignoring_case() {
        let mut state = PageState::new();
        let ticket = state.begin(1);
        state.apply(ticket, page_of("Widget", 3));

        assert_eq!(state.filtered("widget-1").len(), 1);
        assert_eq!(state.filtered("WIDGET").len(), 3);
        assert_eq!(state.filtered("").len(), 3);
        assert!(state.filtered("gadget").is_empty());
    }

    #[tokio::test]
    async fn pager_accumulates_until_short_page() {
        let transport = FakeTransport::serving(vec![page_of("one", 10), page_of("two", 4)]);
        let client = PageClient::new(transport, MemoryStore::new());
        let mut pager = Pager::new(client, "acme".to_string(), "token".to_string());

        assert!(!pager.load_first(false).await.unwrap());
        assert_eq!(pager.load_more().await.unwrap(), Some(false));
        assert_eq!(pager.state().repositories().len(), 14);
        assert!(!pager.state().has_more());
        assert_eq!(pager.load_more().await.unwrap(), None);

        // page 1 is cached, but refresh still goes to the network
        assert!(!pager.refresh().await.unwrap());
        assert_eq!(pager.state().repositories().len(), 10);
        assert!(pager.state().has_more());
    }

    #[tokio::test]
    async fn pager_reports_cached_first_page() {
        let transport = FakeTransport::serving(vec![page_of("one", 10)]);
        let client = PageClient::new(transport, MemoryStore::new());
        let mut pager = Pager::new(client, "acme".to_string(), "token".to_string());

        pager.load_first(false).await.unwrap();
        assert!(pager.load_first(false).await.unwrap());
    }

    #[tokio::test]
    async fn pager_without_token_fails() {
        let client = PageClient::new(FakeTransport::default(), MemoryStore::new());
        let mut pager = Pager::new(client, "acme".to_string(), String::new());

        let result = pager.load_first(false).await;
        assert_eq!(result, Err(ClientError::CredentialMissing));
        assert!(pager.state().repositories().is_empty());
    }
}
