use primitive_types::U256;

/// Digits of the fractional part kept for display.
const MAX_FRACTION_DIGITS: usize = 8;

/// Converts a raw integer token amount into a decimal string using exact
/// integer arithmetic. The fractional part is trimmed of trailing zeros and
/// truncated to [`MAX_FRACTION_DIGITS`]; no floating point is involved until
/// the caller parses the result.
pub fn format_units(raw: U256, decimals: u32) -> String {
    let base = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw / base;
    let fraction = raw % base;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');
    let cut = trimmed.len().min(MAX_FRACTION_DIGITS);
    format!("{whole}.{}", &trimmed[..cut])
}

/// Decimal-converted amount as `f64`, for USD math and JSON output.
pub fn units_to_f64(raw: U256, decimals: u32) -> f64 {
    format_units(raw, decimals).parse().unwrap_or(0.0)
}

/// Parses a provider-reported integer amount, treating garbage as zero the
/// same way the explorer APIs report absent balances.
pub fn parse_raw_amount(value: &str) -> U256 {
    U256::from_dec_str(value.trim()).unwrap_or_else(|_| U256::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn whole_amounts_have_no_fraction() {
        assert_eq!(format_units(U256::from(5u64) * U256::exp10(18), 18), "5");
        assert_eq!(format_units(U256::zero(), 18), "0");
    }

    #[test]
    fn fraction_is_trimmed_and_truncated() {
        // 1.5 tokens at 18 decimals
        let raw = U256::from(15u64) * U256::exp10(17);
        assert_eq!(format_units(raw, 18), "1.5");

        // 1 wei sits past the 8 kept digits and truncates to zero
        assert_eq!(format_units(U256::one(), 18), "0.00000000");
        assert_eq!(units_to_f64(U256::one(), 18), 0.0);

        // repeating digits are cut at 8
        let raw = U256::from_dec_str("1123456789012345678").unwrap();
        assert_eq!(format_units(raw, 18), "1.12345678");
    }

    #[test]
    fn low_decimal_tokens() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn parse_raw_amount_tolerates_garbage() {
        assert_eq!(parse_raw_amount("123"), U256::from(123u64));
        assert_eq!(parse_raw_amount("not-a-number"), U256::zero());
        assert_eq!(parse_raw_amount(""), U256::zero());
    }
}
