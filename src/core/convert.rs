//! Amount conversion and display formatting

use crate::core::error::RateError;
use crate::core::rates::RateTable;

/// Parses user input the way the amount field accepts it: characters other
/// than digits, `.` and `,` are dropped and `,` is read as a decimal point.
///
/// The whole cleaned string must parse, so `"12,5"` is 12.5 and `"1.2.3"` is
/// [`RateError::InvalidAmount`] rather than being cut at the first bad
/// separator.
pub fn parse_amount(input: &str) -> Result<f64, RateError> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned
        .parse::<f64>()
        .map_err(|_| RateError::InvalidAmount(input.to_string()))
}

/// `amount * rate` with exactly two decimal digits. Halves round away from
/// zero, so 0.125 displays as `0.13`.
pub fn convert(amount: f64, rate: f64) -> String {
    let cents = (amount * rate * 100.0).round();
    format!("{:.2}", cents / 100.0)
}

/// Converts `amount` into `target` using `table`, reporting
/// [`RateError::RateUnavailable`] when the table has no rate for it.
pub fn convert_with_table(amount: f64, table: &RateTable, target: &str) -> Result<String, RateError> {
    table
        .rate(target)
        .map(|rate| convert(amount, rate))
        .ok_or_else(|| RateError::RateUnavailable {
            code: target.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_convert_rounds_to_two_decimals() {
        assert_eq!(convert(100.0, 0.85), "85.00");
        assert_eq!(convert(33.333, 2.0), "66.67");
        assert_eq!(convert(1.0, 1.0), "1.00");
        assert_eq!(convert(0.0, 1.2345), "0.00");
    }

    #[test]
    fn test_convert_rounds_half_away_from_zero() {
        assert_eq!(convert(1.0, 0.125), "0.13");
        assert_eq!(convert(10.0, 0.0625), "0.63");
        assert_eq!(convert(-1.0, 0.125), "-0.13");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100").unwrap(), 100.0);
        assert_eq!(parse_amount("33.333").unwrap(), 33.333);
        assert_eq!(parse_amount("12,5").unwrap(), 12.5);
        assert_eq!(parse_amount(" $1 000 ").unwrap(), 1000.0);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(parse_amount(""), Err(RateError::InvalidAmount(_))));
        assert!(matches!(parse_amount("abc"), Err(RateError::InvalidAmount(_))));
        assert!(matches!(parse_amount("1.2.3"), Err(RateError::InvalidAmount(_))));
    }

    #[test]
    fn test_convert_with_table() {
        let table = RateTable::new(BTreeMap::from([("EUR".to_string(), 0.85)])).unwrap();

        assert_eq!(convert_with_table(100.0, &table, "EUR").unwrap(), "85.00");
        match convert_with_table(100.0, &table, "GBP") {
            Err(RateError::RateUnavailable { code }) => assert_eq!(code, "GBP"),
            other => panic!("expected RateUnavailable, got {other:?}"),
        }
    }
}
