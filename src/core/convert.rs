//! Pure arithmetic between mithqals and money.
use crate::core::error::ParseError;

/// Grams in one mithqal.
pub const MITHQAL_TO_GRAM: f64 = 3.641667;

/// Grams in one troy ounce.
pub const TROY_OUNCE_TO_GRAM: f64 = 31.1035;

pub fn price_per_gram_from_troy_ounce(price_per_ounce: f64) -> f64 {
    price_per_ounce / TROY_OUNCE_TO_GRAM
}

/// Value of `mithqals` in the target currency.
///
/// `exchange_rate` is units of target currency per USD (1 for USD).
pub fn mithqals_to_money(
    mithqals: f64,
    metal_price_per_gram: f64,
    mithqal_to_gram: f64,
    exchange_rate: f64,
) -> f64 {
    let usd_per_mithqal = metal_price_per_gram * mithqal_to_gram;
    mithqals * usd_per_mithqal * exchange_rate
}

/// Mithqals purchasable with `money` in the target currency.
pub fn money_to_mithqals(
    money: f64,
    metal_price_per_gram: f64,
    mithqal_to_gram: f64,
    exchange_rate: f64,
) -> f64 {
    let usd_per_mithqal = metal_price_per_gram * mithqal_to_gram;
    let money_in_usd = money / exchange_rate;
    money_in_usd / usd_per_mithqal
}

fn strip_grouping(text: &str) -> String {
    text.trim().chars().filter(|c| *c != ',').collect()
}

/// Parses a locale-formatted amount such as `1,234.5`. Only positive,
/// finite amounts are accepted.
pub fn parse_amount(text: &str) -> Result<f64, ParseError> {
    let cleaned = strip_grouping(text);
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }
    let value: f64 = cleaned
        .parse()
        .map_err(|_| ParseError::NotANumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(ParseError::NotANumber(text.to_string()));
    }
    if value <= 0.0 {
        return Err(ParseError::NotPositive(value));
    }
    Ok(value)
}

/// Custom exchange rate from its text field, falling back to 1.
pub fn parse_custom_rate(text: &str) -> f64 {
    parse_amount(text).unwrap_or(1.0)
}

/// Counterpart field text: exactly two fraction digits, no grouping.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Inserts `,` thousands separators into the integer part of a decimal string.
pub fn group_thousands(text: &str) -> String {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (text, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_example() {
        let per_gram = price_per_gram_from_troy_ounce(2400.0);
        assert!((per_gram - 77.1617).abs() < 0.001);

        let usd_per_mithqal = per_gram * MITHQAL_TO_GRAM;
        assert!((usd_per_mithqal - 281.0).abs() < 0.1);

        let money = mithqals_to_money(10.0, per_gram, MITHQAL_TO_GRAM, 1.0);
        assert_eq!(format_amount(money), format_amount(10.0 * usd_per_mithqal));
        assert!((money - 2809.97).abs() < 0.01);
    }

    #[test]
    fn test_round_trip() {
        for (mithqals, price, rate) in [(10.0, 77.16, 1.0), (0.25, 0.95, 42_000.0), (3.5, 80.0, 0.92)] {
            let money = mithqals_to_money(mithqals, price, MITHQAL_TO_GRAM, rate);
            let back = money_to_mithqals(money, price, MITHQAL_TO_GRAM, rate);
            assert!((back - mithqals).abs() < 0.005, "{mithqals} -> {money} -> {back}");
        }
    }

    #[test]
    fn test_exchange_rate_applies_both_ways() {
        let usd = mithqals_to_money(2.0, 50.0, 1.0, 1.0);
        let eur = mithqals_to_money(2.0, 50.0, 1.0, 0.5);
        assert_eq!(usd, 100.0);
        assert_eq!(eur, 50.0);
        assert_eq!(money_to_mithqals(50.0, 50.0, 1.0, 0.5), 2.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.50"), Ok(1234.5));
        assert_eq!(parse_amount(" 10 "), Ok(10.0));
        assert_eq!(parse_amount(""), Err(ParseError::Empty));
        assert_eq!(parse_amount("0"), Err(ParseError::NotPositive(0.0)));
        assert_eq!(parse_amount("-5"), Err(ParseError::NotPositive(-5.0)));
        assert!(matches!(parse_amount("abc"), Err(ParseError::NotANumber(_))));
        assert!(matches!(parse_amount("inf"), Err(ParseError::NotANumber(_))));
    }

    #[test]
    fn test_custom_rate_defaults_to_one() {
        assert_eq!(parse_custom_rate("abc"), 1.0);
        assert_eq!(parse_custom_rate(""), 1.0);
        assert_eq!(parse_custom_rate("42,000"), 42_000.0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_amount(2809.4), "2809.40");
        assert_eq!(group_thousands("2809.40"), "2,809.40");
        assert_eq!(group_thousands("1234567"), "1,234,567");
        assert_eq!(group_thousands("999.99"), "999.99");
        assert_eq!(group_thousands("-1000.00"), "-1,000.00");
    }
}
