use crate::core::cache::{CacheAside, Cached, KeyValueStore};
use crate::core::currency::CurrencySelection;
use crate::core::error::RateError;
use crate::core::rates::{RateSource, RateTable};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const RATES_KEY_PREFIX: &str = "rates_";
pub const CURRENCY_LIST_KEY: &str = "currency_rates";

/// Store key under which the rate table for `base` is cached.
pub fn rates_key(base: &str) -> String {
    format!("{RATES_KEY_PREFIX}{base}")
}

/// Rate tables served from a persistent cache, refreshed from `S` once they
/// are older than the TTL.
pub struct CachingRateProvider<S: RateSource> {
    inner: S,
    cache: CacheAside,
    ttl: Duration,
}

impl<S: RateSource> CachingRateProvider<S> {
    pub fn new(inner: S, store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: CacheAside::new(store),
            ttl,
        }
    }

    /// Rate table for `base`. Fails only when the source fails and nothing is
    /// cached for `base`.
    pub async fn get_rates(&self, base: &str) -> Result<RateTable, RateError> {
        self.get_rates_cached(base).await.map(|cached| cached.value)
    }

    /// Like [`Self::get_rates`], also reporting whether a stale copy was
    /// served.
    pub async fn get_rates_cached(&self, base: &str) -> Result<Cached<RateTable>, RateError> {
        let key = rates_key(base);
        debug!("Resolving rates for base {}", base);
        self.cache
            .get_or_fetch(&key, self.ttl, || self.inner.fetch_rates(Some(base)))
            .await
    }

    /// Every currency the source quotes against its default base, sorted by
    /// code.
    pub async fn list_currencies(&self) -> Result<Cached<Vec<CurrencySelection>>, RateError> {
        let cached = self.default_rates().await?;
        Ok(Cached {
            value: cached.value.codes().map(CurrencySelection::from_code).collect(),
            is_stale: cached.is_stale,
            fetched_at: cached.fetched_at,
        })
    }

    async fn default_rates(&self) -> Result<Cached<RateTable>, RateError> {
        self.cache
            .get_or_fetch(CURRENCY_LIST_KEY, self.ttl, || self.inner.fetch_rates(None))
            .await
    }

    /// Cached bases with the fetch time of their table, when readable.
    pub async fn cached_bases(&self) -> Result<Vec<(String, Option<i64>)>> {
        let entries = self.cache.entries(RATES_KEY_PREFIX).await?;
        Ok(entries
            .into_iter()
            .map(|(key, ts)| (key.trim_start_matches(RATES_KEY_PREFIX).to_string(), ts))
            .collect())
    }

    /// Drops cached rate tables older than `max_age`.
    pub async fn prune(&self, max_age: Duration) -> Result<usize> {
        self.cache.prune(RATES_KEY_PREFIX, max_age).await
    }

    /// Drops every cached rate table and the currency list.
    pub async fn clear(&self) -> Result<usize> {
        let rates = self.cache.clear(RATES_KEY_PREFIX).await?;
        let list = self.cache.clear(CURRENCY_LIST_KEY).await?;
        Ok(rates + list)
    }
}
