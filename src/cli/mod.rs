//! Command implementations behind the `fxconv` binary

pub mod cache;
pub mod convert;
pub mod currencies;
pub mod rates;
pub mod select;
pub mod setup;
pub mod ui;
