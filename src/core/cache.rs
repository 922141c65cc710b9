use crate::core::error::RateError;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// String-keyed storage of JSON blobs. Single-key writes are atomic; there
/// are no transactions and no built-in expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// A value as persisted by [`CacheAside`], stamped with its fetch time in
/// epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub timestamp: i64,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(timestamp: i64, data: T) -> Self {
        Self { timestamp, data }
    }

    pub fn is_fresh(&self, ttl: Duration, now: i64) -> bool {
        now.saturating_sub(self.timestamp) < as_millis(ttl)
    }
}

fn as_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Outcome of a cache-aside lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    /// True when the value is older than the TTL and was served because the
    /// refresh failed.
    pub is_stale: bool,
    pub fetched_at: i64,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Cache-aside over a [`KeyValueStore`]: fresh entries are served directly,
/// misses are fetched and stored, and failed refreshes fall back to whatever
/// entry exists regardless of age.
pub struct CacheAside {
    store: Arc<dyn KeyValueStore>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `key` from the cache or by calling `fetch`.
    ///
    /// Concurrent calls for the same key are serialized, so a second caller
    /// sees the entry written by the first instead of fetching again. Only a
    /// successful fetch writes to the store.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Cached<T>, RateError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.resolve(key, ttl, fetch).await
        };
        self.release(key, lock).await;
        result
    }

    async fn resolve<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Cached<T>, RateError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let now = now_millis();
        if let Some(entry) = self.read_entry::<T>(key).await {
            if entry.is_fresh(ttl, now) {
                debug!("Cache HIT for key: {}", key);
                return Ok(Cached {
                    value: entry.data,
                    is_stale: false,
                    fetched_at: entry.timestamp,
                });
            }
            debug!("Cache entry expired for key: {}", key);
        } else {
            debug!("Cache MISS for key: {}", key);
        }

        match fetch().await {
            Ok(value) => {
                let entry = CacheEntry::new(now, value);
                self.write_entry(key, &entry).await;
                Ok(Cached {
                    value: entry.data,
                    is_stale: false,
                    fetched_at: now,
                })
            }
            Err(err) => match self.read_entry::<T>(key).await {
                Some(entry) => {
                    warn!(key = %key, error = %err, "Fetch failed, serving stale cache entry");
                    Ok(Cached {
                        value: entry.data,
                        is_stale: true,
                        fetched_at: entry.timestamp,
                    })
                }
                None => Err(RateError::FetchFailure {
                    key: key.to_string(),
                    source: err,
                }),
            },
        }
    }

    /// Reads and decodes the entry at `key`. Storage and decode errors are
    /// logged and reported as a miss.
    pub async fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn write_entry<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let res: Result<()> = async {
            let raw = serde_json::to_string(entry)?;
            self.store.set(key, &raw).await
        }
        .await;
        match res {
            Ok(()) => debug!("Cache PUT for key: {}", key),
            Err(e) => warn!(key = %key, error = %e, "Failed to write cache entry"),
        }
    }

    /// Keys under `prefix` with the timestamp of their entry. Unreadable
    /// entries are reported with `None`.
    pub async fn entries(&self, prefix: &str) -> Result<Vec<(String, Option<i64>)>> {
        let keys = self.store.keys_with_prefix(prefix).await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let timestamp = self
                .read_entry::<IgnoredAny>(&key)
                .await
                .map(|entry| entry.timestamp);
            entries.push((key, timestamp));
        }
        Ok(entries)
    }

    /// Removes entries under `prefix` older than `max_age`, along with any
    /// that can no longer be decoded. Returns the number removed.
    pub async fn prune(&self, prefix: &str, max_age: Duration) -> Result<usize> {
        let now = now_millis();
        let max_age = as_millis(max_age);
        let mut removed = 0;
        for (key, timestamp) in self.entries(prefix).await? {
            let expired = timestamp.is_none_or(|ts| now.saturating_sub(ts) >= max_age);
            if expired {
                self.store.remove(&key).await?;
                debug!("Cache REMOVE for key: {}", key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every entry under `prefix`. Returns the number removed.
    pub async fn clear(&self, prefix: &str) -> Result<usize> {
        let keys = self.store.keys_with_prefix(prefix).await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        debug!("Cache CLEAR for prefix: {}", prefix);
        Ok(keys.len())
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().await;
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    async fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.in_flight.lock().await;
        // Only the map and this handle remain: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(3600);

    fn cache_with_store() -> (CacheAside, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CacheAside::new(store.clone()), store)
    }

    async fn seed(store: &MemoryStore, key: &str, age: Duration, value: i32) {
        let entry = CacheEntry::new(now_millis() - age.as_millis() as i64, value);
        store
            .set(key, &serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let (cache, store) = cache_with_store();
        seed(&store, "k", Duration::from_secs(60), 7).await;
        let calls = AtomicUsize::new(0);

        let got = cache
            .get_or_fetch("k", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .await
            .unwrap();

        assert_eq!(got.value, 7);
        assert!(!got.is_stale);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let (cache, store) = cache_with_store();
        let before = now_millis();

        let got = cache
            .get_or_fetch("k", TTL, || async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(got.value, 42);
        assert!(!got.is_stale);

        let raw = store.get("k").await.unwrap().unwrap();
        let entry: CacheEntry<i32> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.data, 42);
        assert!(entry.timestamp >= before);
    }

    #[tokio::test]
    async fn test_stale_entry_refreshed_on_success() {
        let (cache, store) = cache_with_store();
        seed(&store, "k", Duration::from_secs(7200), 1).await;

        let got = cache
            .get_or_fetch("k", TTL, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(got.value, 2);

        let entry = cache.read_entry::<i32>("k").await.unwrap();
        assert_eq!(entry.data, 2);
        assert!(entry.is_fresh(TTL, now_millis()));
    }

    #[tokio::test]
    async fn test_stale_fallback_on_fetch_failure() {
        let (cache, store) = cache_with_store();
        seed(&store, "k", Duration::from_secs(86_400), 5).await;

        let got = cache
            .get_or_fetch::<i32, _, _>("k", TTL, || async { Err(anyhow!("network down")) })
            .await
            .unwrap();
        assert_eq!(got.value, 5);
        assert!(got.is_stale);

        // The fallback path does not rewrite the entry.
        let entry = cache.read_entry::<i32>("k").await.unwrap();
        assert!(!entry.is_fresh(TTL, now_millis()));
    }

    #[tokio::test]
    async fn test_miss_and_failure_is_fetch_failure() {
        let (cache, _store) = cache_with_store();

        let err = cache
            .get_or_fetch::<i32, _, _>("k", TTL, || async { Err(anyhow!("network down")) })
            .await
            .unwrap_err();
        match err {
            RateError::FetchFailure { key, source } => {
                assert_eq!(key, "k");
                assert!(source.to_string().contains("network down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_entry_treated_as_miss() {
        let (cache, store) = cache_with_store();
        store.set("k", "not json").await.unwrap();

        let got = cache
            .get_or_fetch("k", TTL, || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(got.value, 3);
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let now = 1_700_000_000_000;
        assert!(!CacheEntry::new(now - 3_600_000, ()).is_fresh(TTL, now));
        assert!(CacheEntry::new(now - 3_599_000, ()).is_fresh(TTL, now));
        assert!(!CacheEntry::new(i64::MIN, ()).is_fresh(TTL, now));
        assert!(CacheEntry::new(now, ()).is_fresh(Duration::MAX, now));
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let (cache, store) = cache_with_store();
        seed(&store, "expired", TTL, 1).await;
        seed(&store, "fresh", TTL - Duration::from_secs(1), 1).await;
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;
        let fetch = move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        };

        let got = cache.get_or_fetch("expired", TTL, fetch).await.unwrap();
        assert_eq!(got.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let got = cache.get_or_fetch("fresh", TTL, fetch).await.unwrap();
        assert_eq!(got.value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extreme_timestamp_is_refetched_and_pruned() {
        let (cache, store) = cache_with_store();
        let raw = r#"{"timestamp": -9223372036854775808, "data": 1}"#;
        store.set("rates_USD", raw).await.unwrap();
        store.set("rates_EUR", raw).await.unwrap();

        let got = cache
            .get_or_fetch("rates_USD", TTL, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(got.value, 2);
        assert!(!got.is_stale);

        let removed = cache.prune("rates_", Duration::MAX).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("rates_EUR").await.unwrap().is_none());
        assert!(store.get("rates_USD").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_lookups_fetch_once() {
        let (cache, _store) = cache_with_store();
        let calls = AtomicUsize::new(0);

        let (cache_ref, calls_ref) = (&cache, &calls);
        let lookup = move || {
            cache_ref.get_or_fetch("k", TTL, move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(11)
            })
        };
        let results = futures::future::join_all([lookup(), lookup(), lookup()]).await;

        for result in results {
            assert_eq!(result.unwrap().value, 11);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_prune_and_clear() {
        let (cache, store) = cache_with_store();
        seed(&store, "rates_USD", Duration::from_secs(60), 1).await;
        seed(&store, "rates_EUR", Duration::from_secs(3 * 86_400), 2).await;
        store.set("rates_BAD", "garbage").await.unwrap();
        store.set("other", "keep").await.unwrap();

        let removed = cache
            .prune("rates_", Duration::from_secs(86_400))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.get("rates_USD").await.unwrap().is_some());
        assert!(store.get("rates_EUR").await.unwrap().is_none());

        assert_eq!(cache.clear("rates_").await.unwrap(), 1);
        assert!(store.get("rates_USD").await.unwrap().is_none());
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("keep"));
    }
}
