//! Currency selections as shown in the picker

use serde::{Deserialize, Serialize};

const UNKNOWN_FLAG: &str = "🏳️";

/// A currency picked by the user. Display-only: never used in arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySelection {
    pub code: String,
    pub name: String,
    pub flag: String,
}

impl CurrencySelection {
    /// Builds a selection named after its code, with a flag derived from the
    /// country prefix of the code.
    pub fn from_code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: code.to_string(),
            flag: flag_for(code),
        }
    }
}

/// Regional-indicator flag for the first two letters of an ISO-4217 code.
/// Codes in the `X` range (metals, SDR, testing) have no country.
pub fn flag_for(code: &str) -> String {
    let bytes = code.as_bytes();
    if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
        return UNKNOWN_FLAG.to_string();
    }
    let upper = code.to_ascii_uppercase();
    if upper.starts_with('X') {
        return UNKNOWN_FLAG.to_string();
    }
    upper
        .chars()
        .take(2)
        .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

/// Case-insensitive match on code or name, as typed into the picker search.
pub fn filter_currencies<'a>(
    currencies: &'a [CurrencySelection],
    query: &str,
) -> Vec<&'a CurrencySelection> {
    let query = query.to_lowercase();
    currencies
        .iter()
        .filter(|c| c.code.to_lowercase().contains(&query) || c.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_for_country_codes() {
        assert_eq!(flag_for("USD"), "🇺🇸");
        assert_eq!(flag_for("EUR"), "🇪🇺");
        assert_eq!(flag_for("jpy"), "🇯🇵");
    }

    #[test]
    fn test_flag_for_unknown_codes() {
        assert_eq!(flag_for("XAU"), UNKNOWN_FLAG);
        assert_eq!(flag_for("US"), UNKNOWN_FLAG);
        assert_eq!(flag_for("U1D"), UNKNOWN_FLAG);
        assert_eq!(flag_for(""), UNKNOWN_FLAG);
    }

    #[test]
    fn test_filter_currencies() {
        let list: Vec<_> = ["USD", "EUR", "GBP", "AUD"]
            .into_iter()
            .map(CurrencySelection::from_code)
            .collect();

        let codes = |q: &str| {
            filter_currencies(&list, q)
                .into_iter()
                .map(|c| c.code.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(codes("ud"), vec!["USD", "AUD"]);
        assert_eq!(codes("eur"), vec!["EUR"]);
        assert_eq!(codes(""), vec!["USD", "EUR", "GBP", "AUD"]);
        assert!(codes("zzz").is_empty());
    }
}
