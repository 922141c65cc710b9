use super::ui::{StyleType, new_spinner, style_text};
use crate::core::convert::{convert_with_table, parse_amount};
use crate::core::currency::CurrencySelection;
use crate::core::error::RateError;
use crate::core::rates::RateSource;
use crate::core::state::AppState;
use crate::providers::CachingRateProvider;
use anyhow::{Result, bail};
use tracing::debug;

/// What the user sees after a conversion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Converted { result: String, stale: bool },
    /// The target code is missing from the base's rate table.
    Unavailable { code: String },
}

/// Converts `amount` between the selected currencies and records the result
/// in `state`. Only [`RateError::FetchFailure`] and
/// [`RateError::InvalidAmount`] are returned as errors.
pub async fn convert_amount<S: RateSource>(
    provider: &CachingRateProvider<S>,
    state: &mut AppState,
    amount: &str,
) -> Result<ConversionOutcome, RateError> {
    let value = parse_amount(amount)?;
    let from = state.from().code.clone();
    let to = state.to().code.clone();

    let rates = provider.get_rates_cached(&from).await?;
    match convert_with_table(value, &rates.value, &to) {
        Ok(result) => {
            debug!(%from, %to, %result, "Converted amount");
            state.record_conversion(amount, &result).await;
            Ok(ConversionOutcome::Converted {
                result,
                stale: rates.is_stale,
            })
        }
        Err(RateError::RateUnavailable { code }) => Ok(ConversionOutcome::Unavailable { code }),
        Err(e) => Err(e),
    }
}

pub async fn run<S: RateSource>(
    provider: &CachingRateProvider<S>,
    state: &mut AppState,
    amount: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    if let Some(code) = from {
        state.select_from(CurrencySelection::from_code(code)).await;
    }
    if let Some(code) = to {
        state.select_to(CurrencySelection::from_code(code)).await;
    }

    let amount = match amount {
        Some(amount) => amount.to_string(),
        None if !state.amount().is_empty() => state.amount().to_string(),
        None => bail!("No amount given and no previous amount to reuse"),
    };

    let spinner = new_spinner("Fetching rates...");
    let outcome = convert_amount(provider, state, &amount).await;
    spinner.finish_and_clear();

    let from = state.from();
    let to = state.to();
    match outcome? {
        ConversionOutcome::Converted { result, stale } => {
            println!("{} {} {} =", from.flag, amount, from.code);
            println!(
                "{} {} {}",
                to.flag,
                style_text(&result, StyleType::Result),
                to.code
            );
            if stale {
                println!(
                    "{}",
                    style_text(
                        "Rates could not be refreshed; showing cached rates",
                        StyleType::Warning
                    )
                );
            }
        }
        ConversionOutcome::Unavailable { code } => {
            println!(
                "{}",
                style_text(&format!("Error: no rate for {code}"), StyleType::Error)
            );
        }
    }
    Ok(())
}
