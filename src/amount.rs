//! Amount conversions.
//!
//! Every amount in the ledger is a `U256` in the token's smallest unit.
//! Phase 1 claim amounts come straight from the `Transfer` log and phase 2
//! native values straight from the transaction, so nothing is rescaled on
//! the way in. Human-readable decimals exist only at presentation time.

use alloy_primitives::U256;
use alloy_primitives::utils::{format_units, parse_units};
use anyhow::{Context, Result};
use std::str::FromStr;

/// Both W0G and native 0G use 18 decimals.
pub const TOKEN_DECIMALS: u8 = 18;

/// Total token supply in whole tokens, used for percentage-of-supply figures.
pub const TOTAL_SUPPLY_TOKENS: u64 = 1_000_000_000;

/// Width of a zero-padded amount column. U256::MAX has 78 decimal digits.
const PADDED_WIDTH: usize = 78;

/// Format a raw amount as a human-scaled decimal with trailing zeros removed.
///
/// `12_500_000_000_000_000_000` becomes `"12.5"`, `5 * 10^18` becomes `"5"`.
pub fn format_amount(amount: U256) -> String {
    let formatted = format_units(amount, TOKEN_DECIMALS).unwrap_or_else(|_| amount.to_string());
    trim_fraction(&formatted)
}

/// Parse a human-scaled decimal (e.g. `"12.5"`) into the smallest unit.
pub fn parse_amount(value: &str) -> Result<U256> {
    let parsed = parse_units(value.trim(), TOKEN_DECIMALS)
        .with_context(|| format!("Invalid token amount: {value}"))?;
    Ok(parsed.get_absolute())
}

/// Pad an amount to a fixed width so lexical order equals numeric order.
pub fn pad_amount(amount: &U256) -> String {
    format!("{amount:0>PADDED_WIDTH$}")
}

/// Inverse of [`pad_amount`]. Also accepts unpadded integers.
pub fn unpad_amount(padded: &str) -> Result<U256> {
    let trimmed = padded.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str(trimmed).map_err(|_| anyhow::anyhow!("Invalid amount format: {}", padded))
}

/// Share of total supply as a percentage string with six decimals, e.g. `"0.000013"`.
pub fn percent_of_supply(amount: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS));
    let supply = U256::from(TOTAL_SUPPLY_TOKENS) * unit;
    // percent * 10^6, integer division
    let scaled = amount * U256::from(100_000_000u64) / supply;
    let whole = scaled / U256::from(1_000_000u64);
    let fraction = scaled % U256::from(1_000_000u64);
    format!("{whole}.{:0>6}", fraction.to_string())
}

/// Format an amount with two decimals and thousands separators, e.g. `"1,234.50"`.
pub fn format_grouped(amount: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS));
    let cents_unit = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS - 2));
    let whole = amount / unit;
    let cents = (amount % unit) / cents_unit;

    format!("{}.{:0>2}", group_digits(&whole.to_string()), cents.to_string())
}

/// Insert thousands separators into a string of decimal digits, e.g. `"1000000"` to `"1,000,000"`.
pub fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn trim_fraction(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn formats_scaled_amounts_without_trailing_zeros() {
        assert_eq!(format_amount(tokens(5)), "5");
        assert_eq!(
            format_amount(U256::from(12_500_000_000_000_000_000u128)),
            "12.5"
        );
        assert_eq!(format_amount(U256::ZERO), "0");
        assert_eq!(format_amount(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn parses_scaled_amounts_into_smallest_unit() {
        assert_eq!(
            parse_amount("12.5").unwrap(),
            U256::from(12_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_amount("5").unwrap(), tokens(5));
        assert!(parse_amount("twelve").is_err());
    }

    #[test]
    fn padded_amounts_sort_numerically() {
        let small = pad_amount(&U256::from(9u64));
        let large = pad_amount(&U256::from(10u64));
        assert_eq!(small.len(), 78);
        assert!(small < large);
        assert_eq!(unpad_amount(&large).unwrap(), U256::from(10u64));
        assert_eq!(unpad_amount(&pad_amount(&U256::ZERO)).unwrap(), U256::ZERO);
        assert_eq!(unpad_amount(&pad_amount(&U256::MAX)).unwrap(), U256::MAX);
    }

    #[test]
    fn computes_percent_of_supply() {
        assert_eq!(percent_of_supply(tokens(10_000_000)), "1.000000");
        assert_eq!(percent_of_supply(tokens(130)), "0.000013");
        assert_eq!(percent_of_supply(U256::ZERO), "0.000000");
    }

    #[test]
    fn groups_thousands_with_two_decimals() {
        assert_eq!(
            format_grouped(tokens(1_234) + U256::from(500_000_000_000_000_000u128)),
            "1,234.50"
        );
        assert_eq!(format_grouped(tokens(1_000_000)), "1,000,000.00");
        assert_eq!(format_grouped(U256::ZERO), "0.00");
    }

    #[test]
    fn groups_plain_digit_strings() {
        assert_eq!(group_digits("1000000000"), "1,000,000,000");
        assert_eq!(group_digits("999"), "999");
        assert_eq!(group_digits("1000"), "1,000");
        assert_eq!(group_digits(""), "");
    }
}
