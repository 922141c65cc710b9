use super::ui::{
    StyleType, format_timestamp, header_cell, new_spinner, new_styled_table, rate_cell, style_text,
};
use crate::core::rates::RateSource;
use crate::providers::CachingRateProvider;
use anyhow::Result;
use comfy_table::Cell;

/// Prints the rate table for `base`.
pub async fn run<S: RateSource>(provider: &CachingRateProvider<S>, base: &str) -> Result<()> {
    let spinner = new_spinner(&format!("Fetching rates for {base}..."));
    let rates = provider.get_rates_cached(base).await;
    spinner.finish_and_clear();
    let rates = rates?;

    println!("{}", style_text(&format!("Rates for 1 {base}"), StyleType::Title));
    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Currency"), header_cell("Rate")]);
    for (code, rate) in rates.value.iter() {
        table.add_row(vec![Cell::new(code), rate_cell(rate)]);
    }
    println!("{table}");

    let fetched = format!("Fetched at {}", format_timestamp(Some(rates.fetched_at)));
    println!("{}", style_text(&fetched, StyleType::Subtle));
    if rates.is_stale {
        println!(
            "{}",
            style_text(
                "Rates could not be refreshed; showing cached rates",
                StyleType::Warning
            )
        );
    }
    Ok(())
}
