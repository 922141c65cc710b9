//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;
pub mod state;

// Re-export main types for cleaner imports
pub use cache::{CacheAside, CacheEntry, Cached, KeyValueStore};
pub use currency::CurrencySelection;
pub use error::RateError;
pub use rates::{RateSource, RateTable};
pub use state::{AppState, StatePersistence};
