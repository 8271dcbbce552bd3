//! Client-side page cache.
//!
//! Rated pages are stored per `(organization, page)` key behind the
//! [`CacheStore`] trait, so the page client can run against the durable
//! [`FileStore`] or the in-memory [`MemoryStore`].

mod error;
mod file;
mod memory;

pub use error::CacheError;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::rating::RatedRepository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifies one cached page. Organization names are compared verbatim, so
/// `Acme` and `acme` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub organization: String,
    pub page: u32,
}

impl CacheKey {
    pub fn new(organization: impl Into<String>, page: u32) -> Self {
        Self {
            organization: organization.into(),
            page,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_page_{}", self.organization, self.page)
    }
}

/// A cached page and when it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Rated repositories of the page, in listing order.
    pub data: Vec<RatedRepository>,
}

impl CacheEntry {
    pub fn new(timestamp: i64, data: Vec<RatedRepository>) -> Self {
        Self { timestamp, data }
    }

    /// Returns true if the entry was written less than `expiry` before `now_ms`.
    #[must_use]
    pub fn is_fresh(&self, now_ms: i64, expiry: Duration) -> bool {
        let expiry_ms = i64::try_from(expiry.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < expiry_ms
    }
}

/// Key-value storage for cached pages.
///
/// Writes are last-writer-wins per key.
pub trait CacheStore: Send + Sync {
    /// Returns the entry stored under `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores `entry` under `key`, replacing any previous entry.
    fn set(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn freshness_window_is_exclusive() {
        let entry = CacheEntry::new(1_000, Vec::new());

        assert!(entry.is_fresh(1_000, HOUR));
        assert!(entry.is_fresh(1_000 + 3_599_999, HOUR));
        assert!(!entry.is_fresh(1_000 + 3_600_000, HOUR));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let store = MemoryStore::new();
        store
            .set(&CacheKey::new("Acme", 1), CacheEntry::new(1, Vec::new()))
            .unwrap();

        assert!(store.get(&CacheKey::new("Acme", 1)).is_some());
        assert!(store.get(&CacheKey::new("acme", 1)).is_none());
        assert!(store.get(&CacheKey::new("Acme", 2)).is_none());
    }

    #[test]
    fn set_overwrites_entry() {
        let store = MemoryStore::new();
        let key = CacheKey::new("acme", 1);
        store.set(&key, CacheEntry::new(1, Vec::new())).unwrap();
        store.set(&key, CacheEntry::new(2, Vec::new())).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key).unwrap().timestamp, 2);
    }

    #[test]
    fn key_display() {
        assert_eq!(CacheKey::new("acme", 3).to_string(), "acme_page_3");
    }
}
