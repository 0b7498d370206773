//! # Card Cache
//!
//! Short-lived, process-local cache of registry answers.
//!
//! Caching is purely an optimization: checkout bursts tend to validate the
//! same code several times within a few seconds (field validation, then
//! checkout validation). Entries expire after a TTL, and `Available` cards are
//! never stored so that a card registered a minute ago is picked up on the
//! next attempt.

use crate::card::{CardCode, CardRecord};
use crate::error::RegistryResult;
use crate::lookup::{BoxedCardLookup, CardLookup};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Default time-to-live for cached registry answers (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    inserted_at: Instant,
    /// `None` caches "the registry does not know this card"
    record: Option<CardRecord>,
}

/// Result of a cache probe
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Fresh answer; `None` means the card is known not to exist
    Hit(Option<CardRecord>),
    /// Nothing usable cached, caller must fetch
    Miss,
}

/// TTL cache keyed by normalized card code. Safe to share across tasks.
#[derive(Debug)]
pub struct CardCache {
    ttl: Duration,
    entries: Mutex<HashMap<CardCode, CacheEntry>>,
}

impl CardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CardCode, CacheEntry>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Probe the cache. Expired entries are evicted on the way.
    pub fn get(&self, code: &CardCode) -> CacheLookup {
        let mut entries = self.lock();

        let expired = match entries.get(code) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return CacheLookup::Miss,
        };

        if expired {
            entries.remove(code);
            return CacheLookup::Miss;
        }

        match entries.get(code).map(|entry| &entry.record) {
            Some(Some(record)) if !record.status.is_cacheable() => CacheLookup::Miss,
            Some(record) => CacheLookup::Hit(record.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Store a registry answer. Returns `false` when the answer is not cacheable.
    pub fn put(&self, code: CardCode, record: Option<CardRecord>) -> bool {
        if matches!(&record, Some(r) if !r.status.is_cacheable()) {
            return false;
        }

        self.lock().insert(
            code,
            CacheEntry {
                inserted_at: Instant::now(),
                record,
            },
        );
        true
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for CardCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// A `CardLookup` that consults a `CardCache` before the wrapped lookup.
///
/// Registry errors are passed through and never cached.
#[derive(Clone)]
pub struct CachedCardLookup {
    inner: BoxedCardLookup,
    cache: Arc<CardCache>,
}

impl CachedCardLookup {
    pub fn new(inner: BoxedCardLookup, cache: Arc<CardCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl CardLookup for CachedCardLookup {
    #[instrument(skip(self), fields(code = %code))]
    async fn fetch_card(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>> {
        if let CacheLookup::Hit(record) = self.cache.get(code) {
            debug!("Card cache hit");
            return Ok(record);
        }

        let record = self.inner.fetch_card(code).await?;
        let stored = self.cache.put(code.clone(), record.clone());
        debug!(
            source = self.inner.source_name(),
            stored, "Card cache miss, fetched from source"
        );

        Ok(record)
    }

    fn source_name(&self) -> &'static str {
        self.inner.source_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardStatus;
    use crate::testing::FakeLookup;

    fn code(raw: &str) -> CardCode {
        CardCode::parse(raw).unwrap()
    }

    fn record(raw: &str, status: CardStatus) -> CardRecord {
        CardRecord::new(code(raw), status)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_then_miss_after() {
        let cache = CardCache::new(Duration::from_secs(300));
        cache.put(code("AB12"), Some(record("AB12", CardStatus::Active)));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(matches!(cache.get(&code("ab 12")), CacheLookup::Hit(Some(_))));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&code("AB12")), CacheLookup::Miss);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_cards_are_cached() {
        let cache = CardCache::default();
        assert!(cache.put(code("NOPE"), None));
        assert_eq!(cache.get(&code("NOPE")), CacheLookup::Hit(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_available_never_cached() {
        let cache = CardCache::default();
        assert!(!cache.put(code("NEW1"), Some(record("NEW1", CardStatus::Available))));
        assert_eq!(cache.get(&code("NEW1")), CacheLookup::Miss);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = CardCache::new(Duration::from_secs(10));
        cache.put(code("OLD"), None);
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.put(code("NEW"), None);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&code("NEW")), CacheLookup::Hit(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_lookup_skips_second_fetch() {
        let fake = Arc::new(FakeLookup::new().with_card("AB12", CardStatus::Active));
        let lookup = CachedCardLookup::new(fake.clone(), Arc::new(CardCache::default()));

        let first = lookup.fetch_card(&code("AB12")).await.unwrap();
        let second = lookup.fetch_card(&code(" ab12")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.calls(), 1);

        tokio::time::advance(DEFAULT_CACHE_TTL).await;
        lookup.fetch_card(&code("AB12")).await.unwrap();
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_lookup_always_refetches_available() {
        let fake = Arc::new(FakeLookup::new().with_card("NEW1", CardStatus::Available));
        let lookup = CachedCardLookup::new(fake.clone(), Arc::new(CardCache::default()));

        for _ in 0..3 {
            let record = lookup.fetch_card(&code("NEW1")).await.unwrap().unwrap();
            assert_eq!(record.status, CardStatus::Available);
        }
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_lookup_does_not_cache_errors() {
        let fake = Arc::new(FakeLookup::new().failing("DOWN"));
        let cache = Arc::new(CardCache::default());
        let lookup = CachedCardLookup::new(fake.clone(), cache.clone());

        assert!(lookup.fetch_card(&code("DOWN")).await.is_err());
        assert!(lookup.fetch_card(&code("DOWN")).await.is_err());
        assert_eq!(fake.calls(), 2);
        assert!(cache.is_empty());
    }
}
