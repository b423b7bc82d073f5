use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use thiserror::Error;

/// Whole tokens moved by a sponsored deposit.
pub const SPONSORED_DEPOSIT_TOKENS: u64 = 10;

/// `SPONSORED_DEPOSIT_TOKENS` in base units (18 decimals).
pub const SPONSORED_DEPOSIT_AMOUNT: U256 =
    U256::from_limbs([SPONSORED_DEPOSIT_TOKENS * 1_000_000_000_000_000_000, 0, 0, 0]);

/// Validation failures for user-entered amounts. The messages double as the
/// status text shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Please enter a valid amount.")]
    Invalid,

    #[error("Invalid amount format.")]
    Format,
}

/// Parse a decimal token amount into base units (18 decimals).
///
/// Empty, non-numeric, and non-positive input is rejected as
/// [`AmountError::Invalid`]; numeric input that does not fit 18 decimals is
/// [`AmountError::Format`].
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    let numeric: f64 = trimmed.parse().map_err(|_| AmountError::Invalid)?;
    if !numeric.is_finite() || numeric <= 0.0 {
        return Err(AmountError::Invalid);
    }

    // A leading `+` passes the numeric check but not the decimal parser.
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let base = parse_ether(unsigned).map_err(|_| AmountError::Format)?;
    if base.is_zero() {
        return Err(AmountError::Format);
    }
    Ok(base)
}

/// Render base units as a decimal token amount with trailing zeros trimmed.
pub fn format_amount(value: U256) -> String {
    let formatted = format_ether(value);
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(tokens: u64) -> U256 {
        U256::from(tokens) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(parse_amount("10").unwrap(), wei(10));
        assert_eq!(parse_amount("1.5").unwrap(), U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(parse_amount(" 2 ").unwrap(), wei(2));
    }

    #[test]
    fn test_parse_explicit_plus_sign() {
        assert_eq!(parse_amount("+5").unwrap(), wei(5));
        assert_eq!(parse_amount(" +0.5 ").unwrap(), U256::from(500_000_000_000_000_000u64));
        assert_eq!(parse_amount("+-5"), Err(AmountError::Invalid));
    }

    #[test]
    fn test_parse_smallest_unit() {
        assert_eq!(parse_amount("0.000000000000000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_large_amount() {
        assert_eq!(parse_amount("1000000").unwrap(), wei(1_000_000));
    }

    #[test]
    fn test_rejects_empty_and_non_numeric() {
        assert_eq!(parse_amount(""), Err(AmountError::Invalid));
        assert_eq!(parse_amount("   "), Err(AmountError::Invalid));
        assert_eq!(parse_amount("abc"), Err(AmountError::Invalid));
        assert_eq!(parse_amount("NaN"), Err(AmountError::Invalid));
        assert_eq!(parse_amount("inf"), Err(AmountError::Invalid));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(parse_amount("0"), Err(AmountError::Invalid));
        assert_eq!(parse_amount("0.0"), Err(AmountError::Invalid));
        assert_eq!(parse_amount("-1"), Err(AmountError::Invalid));
    }

    #[test]
    fn test_error_messages_are_status_text() {
        assert_eq!(AmountError::Invalid.to_string(), "Please enter a valid amount.");
        assert_eq!(AmountError::Format.to_string(), "Invalid amount format.");
    }

    #[test]
    fn test_sponsored_amount_is_ten_tokens() {
        assert_eq!(SPONSORED_DEPOSIT_AMOUNT, wei(10));
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_amount(wei(10)), "10");
        assert_eq!(format_amount(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_amount(U256::ZERO), "0");
        assert_eq!(format_amount(U256::from(1u64)), "0.000000000000000001");
    }
}
