//! Exchange rate tables and the source abstraction that produces them

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates of one unit of a base currency expressed in other currencies.
///
/// A table is always non-empty and holds only finite rates. It is replaced
/// wholesale on refresh and never merged with an older copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new(rates: BTreeMap<String, f64>) -> Result<Self> {
        if rates.is_empty() {
            return Err(anyhow!("Rate table is empty"));
        }
        if let Some((code, rate)) = rates.iter().find(|(_, rate)| !rate.is_finite()) {
            return Err(anyhow!("Rate for {} is not a finite number: {}", code, rate));
        }
        Ok(Self { rates })
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Currency codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

impl TryFrom<BTreeMap<String, f64>> for RateTable {
    type Error = anyhow::Error;

    fn try_from(rates: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(rates)
    }
}

impl From<RateTable> for BTreeMap<String, f64> {
    fn from(table: RateTable) -> Self {
        table.rates
    }
}

/// A remote service that quotes rate tables.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the table for `base`, or for the service's default base when
    /// `base` is `None`.
    async fn fetch_rates(&self, base: Option<&str>) -> Result<RateTable>;
}
