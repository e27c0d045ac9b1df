//! In-memory TTL cache of normalized series, keyed by indicator name.
//!
//! Every name owns its own async mutex (a *slot*). The facade holds a slot's
//! [`CacheLease`] for the whole check-fetch-store sequence, so at most one
//! fetch per name is in flight and later callers wait for its result. The
//! name → slot map is a sharded [`DashMap`] whose shard locks are never held
//! across an `.await`, so unrelated names never wait on each other.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{TimeSeries, UtcDateTime};

/// How a single acquisition interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then overwrite the entry.
    Refresh,
    /// Always fetch and leave the entry untouched.
    Bypass,
}

/// Last series produced for one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub series: TimeSeries,
    pub fetched_at: UtcDateTime,
}

/// `0 <= now - entry.fetched_at < ttl`.
///
/// An entry stamped after `now` (the wall clock stepped back) is stale.
pub fn is_fresh(entry: &CacheEntry, now: UtcDateTime, ttl: Duration) -> bool {
    let ttl = time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX);
    let elapsed = now.since(entry.fetched_at);
    !elapsed.is_negative() && elapsed < ttl
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Process-wide series cache. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    slots: Arc<DashMap<String, Slot>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self.slots.get(name) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(name.to_owned()).or_default().value())
    }

    /// Current entry for `name`, waiting for any in-flight fetch of that name.
    pub async fn get(&self, name: &str) -> Option<CacheEntry> {
        let slot = self.slots.get(name).map(|slot| Arc::clone(slot.value()))?;
        let entry = slot.lock().await;
        entry.clone()
    }

    /// Overwrites the entry for `name`.
    pub async fn put(&self, name: &str, series: TimeSeries, now: UtcDateTime) {
        let slot = self.slot(name);
        *slot.lock().await = Some(CacheEntry {
            series,
            fetched_at: now,
        });
    }

    /// Takes exclusive ownership of `name`'s slot until the lease is dropped.
    pub async fn lease(&self, name: &str) -> CacheLease {
        let guard = self.slot(name).lock_owned().await;
        CacheLease {
            name: name.to_owned(),
            guard,
        }
    }

    /// Number of indicators holding an entry.
    pub async fn len(&self) -> usize {
        let slots = self
            .slots
            .iter()
            .map(|slot| Arc::clone(slot.value()))
            .collect::<Vec<_>>();

        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Exclusive access to one indicator's entry.
#[derive(Debug)]
pub struct CacheLease {
    name: String,
    guard: OwnedMutexGuard<Option<CacheEntry>>,
}

impl CacheLease {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.guard.as_ref()
    }

    /// Fresh entry under `ttl`, if any.
    pub fn fresh_entry(&self, now: UtcDateTime, ttl: Duration) -> Option<&CacheEntry> {
        self.entry().filter(|entry| is_fresh(entry, now, ttl))
    }

    pub fn store(&mut self, series: TimeSeries, now: UtcDateTime) -> &CacheEntry {
        self.guard.insert(CacheEntry {
            series,
            fetched_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    use crate::domain::SeriesPoint;

    fn at(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_offset_datetime(datetime!(2024-01-01 00:00 UTC))
            .saturating_add(time::Duration::seconds(seconds))
    }

    fn series(value: f64) -> TimeSeries {
        TimeSeries::from_normalized(
            "Taxa Selic",
            vec![SeriesPoint::new(date!(2024-01-02), value)],
        )
    }

    #[tokio::test]
    async fn put_then_get_overwrites() {
        let cache = SeriesCache::new();
        assert!(cache.get("Taxa Selic").await.is_none());

        cache.put("Taxa Selic", series(11.75), at(0)).await;
        cache.put("Taxa Selic", series(11.25), at(10)).await;

        let entry = cache.get("Taxa Selic").await.expect("entry stored");
        assert_eq!(entry.series, series(11.25));
        assert_eq!(entry.fetched_at, at(10));
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn freshness_is_strictly_less_than_ttl() {
        let entry = CacheEntry {
            series: series(1.0),
            fetched_at: at(0),
        };
        let ttl = Duration::from_secs(3600);

        assert!(is_fresh(&entry, at(3599), ttl));
        assert!(!is_fresh(&entry, at(3600), ttl));
        assert!(!is_fresh(&entry, at(3601), ttl));
    }

    #[test]
    fn zero_ttl_is_never_fresh() {
        let entry = CacheEntry {
            series: series(1.0),
            fetched_at: at(0),
        };
        assert!(!is_fresh(&entry, at(0), Duration::ZERO));
    }

    #[test]
    fn entry_from_the_future_is_stale() {
        let entry = CacheEntry {
            series: series(1.0),
            fetched_at: at(60),
        };
        assert!(!is_fresh(&entry, at(0), Duration::from_secs(3600)));
        assert!(is_fresh(&entry, at(60), Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn lease_blocks_same_name_only() {
        let cache = SeriesCache::new();
        let held = cache.lease("Ibovespa").await;

        let other = tokio::time::timeout(Duration::from_millis(100), cache.lease("Taxa Selic")).await;
        assert!(other.is_ok(), "different names must not contend");

        let same = tokio::time::timeout(Duration::from_millis(50), cache.lease("Ibovespa")).await;
        assert!(same.is_err(), "same name waits for the holder");

        drop(held);
        let same = tokio::time::timeout(Duration::from_millis(100), cache.lease("Ibovespa")).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn lease_store_is_visible_after_release() {
        let cache = SeriesCache::new();
        {
            let mut lease = cache.lease("IPCA Mensal").await;
            assert!(lease.entry().is_none());
            lease.store(series(0.42), at(5));
            assert!(lease.fresh_entry(at(6), Duration::from_secs(60)).is_some());
        }

        let entry = cache.get("IPCA Mensal").await.expect("stored through lease");
        assert_eq!(entry.fetched_at, at(5));
    }
}
