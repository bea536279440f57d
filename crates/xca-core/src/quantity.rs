//! # Quantity Parsing
//!
//! JSON-RPC endpoints report numbers as `0x`-prefixed hex quantities, while
//! HTTP callers tend to pass decimal strings. These helpers accept both and
//! always produce 256-bit values.

use alloy_primitives::{B256, U256};

use crate::error::ValidationError;

/// Parse a decimal or `0x`-prefixed hex string into a [`U256`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidQuantity`] for empty input, a bare
/// `0x`, or digits outside the radix.
pub fn parse_quantity(value: &str) -> Result<U256, ValidationError> {
    let trimmed = value.trim();
    let invalid = || ValidationError::InvalidQuantity(value.to_string());

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return Err(invalid());
        }
        return U256::from_str_radix(hex, 16).map_err(|_| invalid());
    }

    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| invalid())
}

/// Parse a quantity that must fit in 64 bits (chain IDs, timestamps).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidQuantity`] on malformed input and
/// [`ValidationError::QuantityOverflow`] when the value exceeds `u64::MAX`.
pub fn parse_u64_quantity(value: &str) -> Result<u64, ValidationError> {
    let wide = parse_quantity(value)?;
    if wide > U256::from(u64::MAX) {
        return Err(ValidationError::QuantityOverflow(value.to_string()));
    }
    Ok(wide.saturating_to::<u64>())
}

/// Parse a `0x`-prefixed 32-byte hex digest.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDigest`] if the input is not exactly
/// 64 hex digits after the prefix.
pub fn parse_digest(value: &str) -> Result<B256, ValidationError> {
    let trimmed = value.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 66 {
        return Err(ValidationError::InvalidDigest(value.to_string()));
    }
    trimmed
        .parse::<B256>()
        .map_err(|_| ValidationError::InvalidDigest(value.to_string()))
}

/// Render a quantity in JSON-RPC form (`0x`-prefixed, no leading zeros).
pub fn format_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_quantity("0x1f4").unwrap(), U256::from(500u64));
        assert_eq!(parse_quantity("500").unwrap(), U256::from(500u64));
        assert_eq!(parse_quantity("0x0").unwrap(), U256::ZERO);
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "0x", "0xzz", "12a", "-1", "1.5"] {
            assert!(parse_quantity(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn handles_full_width() {
        let max = format!("0x{}", "f".repeat(64));
        assert_eq!(parse_quantity(&max).unwrap(), U256::MAX);
        let too_wide = format!("0x1{}", "0".repeat(64));
        assert!(parse_quantity(&too_wide).is_err());
    }

    #[test]
    fn u64_quantity_overflow() {
        assert_eq!(parse_u64_quantity("0x13882").unwrap(), 80002);
        assert!(matches!(
            parse_u64_quantity("0x10000000000000000"),
            Err(ValidationError::QuantityOverflow(_))
        ));
    }

    #[test]
    fn digest_requires_exact_width() {
        let ok = format!("0x{}", "ab".repeat(32));
        assert_eq!(parse_digest(&ok).unwrap(), B256::repeat_byte(0xab));
        assert!(parse_digest("0xabcd").is_err());
        assert!(parse_digest(&"ab".repeat(32)).is_err());
    }

    #[test]
    fn formats_without_leading_zeros() {
        assert_eq!(format_quantity(U256::from(500u64)), "0x1f4");
        assert_eq!(format_quantity(U256::ZERO), "0x0");
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(n in any::<u64>()) {
            let value = U256::from(n);
            prop_assert_eq!(parse_quantity(&format_quantity(value)).unwrap(), value);
            prop_assert_eq!(parse_quantity(&n.to_string()).unwrap(), value);
        }
    }
}
