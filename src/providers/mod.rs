pub mod caching;
pub mod fxrates;

pub use caching::CachingRateProvider;
pub use fxrates::FxRatesProvider;
