use crate::core::cache::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory key-value store, used when persistence is disabled and in tests
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.inner.lock().await;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.inner.lock().await;
        debug!("Store SET for key: {}", key);
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.inner.lock().await;
        store.remove(key);
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let store = self.inner.lock().await;
        Ok(store
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_get_set() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.get("key1").await.unwrap().is_none());

        store.set("key1", "123").await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("123"));

        // Overwrite replaces the value
        store.set("key1", "456").await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("456"));

        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_remove() {
        let store = MemoryStore::new();

        store.set("key1", "123").await.unwrap();
        store.remove("key1").await.unwrap();
        assert!(store.get("key1").await.unwrap().is_none());

        // Removing a missing key is not an error
        store.remove("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_store_keys_with_prefix() {
        let store = MemoryStore::new();
        store.set("rates_EUR", "{}").await.unwrap();
        store.set("rates_USD", "{}").await.unwrap();
        store.set("ratesX", "{}").await.unwrap();
        store.set("from_currency", "{}").await.unwrap();

        let keys = store.keys_with_prefix("rates_").await.unwrap();
        assert_eq!(keys, vec!["rates_EUR".to_string(), "rates_USD".to_string()]);
    }
}
