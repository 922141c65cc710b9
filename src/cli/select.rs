use super::ui::{StyleType, format_timestamp, header_cell, new_styled_table, style_text};
use crate::core::currency::CurrencySelection;
use crate::core::rates::RateSource;
use crate::core::state::AppState;
use crate::providers::CachingRateProvider;
use anyhow::{Result, bail};
use comfy_table::Cell;

/// Picks the source and/or target currency.
pub async fn select(state: &mut AppState, from: Option<&str>, to: Option<&str>) -> Result<()> {
    if from.is_none() && to.is_none() {
        bail!("Nothing to select: pass --from and/or --to");
    }
    if let Some(code) = from {
        state.select_from(CurrencySelection::from_code(code)).await;
    }
    if let Some(code) = to {
        state.select_to(CurrencySelection::from_code(code)).await;
    }
    print_selection(state);
    Ok(())
}

pub async fn swap(state: &mut AppState) -> Result<()> {
    state.swap().await;
    print_selection(state);
    Ok(())
}

/// Shows the current selection, the last result and what is cached.
pub async fn status<S: RateSource>(
    provider: &CachingRateProvider<S>,
    state: &AppState,
) -> Result<()> {
    print_selection(state);
    if !state.converted().is_empty() {
        println!(
            "Last: {} {} = {} {}",
            state.amount(),
            state.from().code,
            style_text(state.converted(), StyleType::Result),
            state.to().code
        );
    }

    let bases = provider.cached_bases().await?;
    if bases.is_empty() {
        println!("{}", style_text("No cached rates", StyleType::Subtle));
        return Ok(());
    }
    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Base"), header_cell("Fetched at")]);
    for (base, fetched_at) in bases {
        table.add_row(vec![Cell::new(base), Cell::new(format_timestamp(fetched_at))]);
    }
    println!("{table}");
    Ok(())
}

fn print_selection(state: &AppState) {
    let from = state.from();
    let to = state.to();
    println!(
        "{} {} → {} {}",
        from.flag,
        style_text(&from.code, StyleType::Title),
        to.flag,
        style_text(&to.code, StyleType::Title)
    );
}
