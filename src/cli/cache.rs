use crate::core::rates::RateSource;
use crate::providers::CachingRateProvider;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

pub async fn prune<S: RateSource>(
    provider: &CachingRateProvider<S>,
    max_age_hours: u64,
) -> Result<()> {
    let removed = provider
        .prune(Duration::from_secs(max_age_hours.saturating_mul(60 * 60)))
        .await?;
    info!(removed, max_age_hours, "Pruned cached rates");
    println!("Removed {removed} cached rate table(s) older than {max_age_hours}h");
    Ok(())
}

pub async fn clear<S: RateSource>(provider: &CachingRateProvider<S>) -> Result<()> {
    let removed = provider.clear().await?;
    info!(removed, "Cleared rate cache");
    let noun = if removed == 1 { "entry" } else { "entries" };
    println!("Removed {removed} cached {noun}");
    Ok(())
}
