//! In-process TTL cache in front of the upstream provider.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::upstream::{SeriesProvider, SeriesQuery};
use crate::error::FetchError;
use crate::models::series::RawSeriesByKey;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

struct CacheSlot<V> {
    inserted_at: Instant,
    value: V,
}

/// Bounded map whose entries expire `ttl` after insertion.
///
/// When full, the oldest insertion is evicted first.
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    slots: HashMap<K, CacheSlot<V>>,
    order: VecDeque<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            clock,
            slots: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn is_fresh(&self, slot: &CacheSlot<V>) -> bool {
        self.clock.now().saturating_duration_since(slot.inserted_at) < self.ttl
    }

    /// Live value for `key`. Expired entries read as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots
            .get(key)
            .filter(|slot| self.is_fresh(slot))
            .map(|slot| slot.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.slots.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        while self.slots.len() >= self.capacity && !self.slots.contains_key(&key) {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.slots.remove(&oldest);
                }
                None => break,
            }
        }

        let inserted_at = self.clock.now();
        self.slots.insert(key.clone(), CacheSlot { inserted_at, value });
        self.order.push_back(key);
    }

    /// Drops every expired entry and returns how many went.
    pub fn evict_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| now.saturating_duration_since(slot.inserted_at) < ttl);
        let slots = &self.slots;
        self.order.retain(|k| slots.contains_key(k));
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// `SeriesProvider` that memoizes successful fetches per query.
pub struct CachedSeriesProvider {
    inner: Arc<dyn SeriesProvider>,
    cache: RwLock<TtlCache<SeriesQuery, RawSeriesByKey>>,
}

impl CachedSeriesProvider {
    pub fn new(
        inner: Arc<dyn SeriesProvider>,
        ttl: Duration,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            cache: RwLock::new(TtlCache::new(ttl, capacity, clock)),
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl SeriesProvider for CachedSeriesProvider {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<RawSeriesByKey, FetchError> {
        if let Some(hit) = self.cache.read().await.get(query) {
            debug!(pattern = %query.pattern, "Series cache hit");
            return Ok(hit);
        }

        let series = self.inner.fetch_series(query).await?;

        let mut cache = self.cache.write().await;
        let evicted = cache.evict_expired();
        if evicted > 0 {
            debug!(evicted, "Evicted expired series");
        }
        cache.insert(query.clone(), series.clone());
        Ok(series)
    }
}
