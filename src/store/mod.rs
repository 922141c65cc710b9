pub mod disk;
pub mod memory;

use crate::core::cache::KeyValueStore;
use crate::core::config::AppConfig;
use anyhow::Result;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::warn;

/// Opens the store selected by the configuration.
///
/// A persistent store that cannot be opened degrades to an in-memory one, so
/// conversions keep working without a cache that outlives the process.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    if !config.cache.persist {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = config.default_data_path()?.join("store");
    match DiskStore::open(&path) {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "Falling back to in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
