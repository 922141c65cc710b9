use super::ui::{StyleType, header_cell, new_spinner, new_styled_table, style_text};
use crate::core::currency::filter_currencies;
use crate::core::rates::RateSource;
use crate::providers::CachingRateProvider;
use anyhow::Result;
use comfy_table::Cell;

/// Lists the currencies the rate service knows, optionally filtered by a
/// search query on code or name.
pub async fn run<S: RateSource>(
    provider: &CachingRateProvider<S>,
    query: Option<&str>,
) -> Result<()> {
    let spinner = new_spinner("Loading currencies...");
    let currencies = provider.list_currencies().await;
    spinner.finish_and_clear();
    let currencies = currencies?;

    let matches = filter_currencies(&currencies.value, query.unwrap_or_default());
    if matches.is_empty() {
        println!("{}", style_text("No matching currencies", StyleType::Subtle));
        return Ok(());
    }

    let mut table = new_styled_table();
    table.set_header(vec![header_cell(""), header_cell("Code"), header_cell("Name")]);
    for currency in matches {
        table.add_row(vec![
            Cell::new(&currency.flag),
            Cell::new(&currency.code),
            Cell::new(&currency.name),
        ]);
    }
    println!("{table}");
    Ok(())
}
