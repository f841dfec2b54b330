// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decimal amount parsing into Starknet `u256` limbs, and the inverse
//! conversion used for display.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use starknet_core::types::Felt;

/// A `u256` amount split into its two 128-bit limbs, as passed in calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedPointPair {
    pub low: u128,
    pub high: u128,
}

impl FixedPointPair {
    /// Split an arbitrary precision integer into limbs.
    ///
    /// Fails with [`AmountError::Overflow`] if the value needs more than 256 bits.
    pub fn from_biguint(value: &BigUint) -> Result<Self, AmountError> {
        if value.bits() > 256 {
            return Err(AmountError::Overflow);
        }

        let mask = (BigUint::from(1u8) << 128u32) - 1u8;
        let low = (value & &mask).to_u128().ok_or(AmountError::Overflow)?;
        let high = (value >> 128u32).to_u128().ok_or(AmountError::Overflow)?;

        Ok(Self { low, high })
    }

    /// Recombine the limbs into a single integer.
    pub fn to_biguint(&self) -> BigUint {
        (BigUint::from(self.high) << 128u32) + BigUint::from(self.low)
    }

    /// `[low, high]` in calldata order.
    pub fn to_calldata(&self) -> [Felt; 2] {
        [Felt::from(self.low), Felt::from(self.high)]
    }

    pub fn is_zero(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Human-readable amount for responses.
    pub fn to_display(&self, decimals: u8) -> f64 {
        format_amount(&self.to_biguint(), decimals)
            .parse()
            .unwrap_or(f64::NAN)
    }
}

/// Errors raised while parsing a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount must not be negative")]
    Negative,

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Amount does not fit in 256 bits")]
    Overflow,
}

/// Convert a decimal string into token base units, split into `u256` limbs.
///
/// The fractional part is right-padded or truncated (never rounded) to
/// exactly `decimals` digits.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "12.5")
/// * `decimals` - Token precision (6 for USDC, 18 for STRK)
pub fn normalize_amount(amount: &str, decimals: u8) -> Result<FixedPointPair, AmountError> {
    let trimmed = amount.trim();

    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if fraction.contains('.') {
        return Err(AmountError::InvalidFormat(
            "more than one decimal point".to_string(),
        ));
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::InvalidFormat("no digits".to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AmountError::InvalidFormat(format!(
            "`{trimmed}` is not a decimal number"
        )));
    }

    let width = decimals as usize;
    let fraction = if fraction.len() >= width {
        fraction[..width].to_string()
    } else {
        format!("{fraction:0<width$}")
    };

    let digits = format!("{whole}{fraction}");
    let value = if digits.is_empty() {
        BigUint::zero()
    } else {
        BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| AmountError::InvalidFormat(format!("`{trimmed}` is not a number")))?
    };

    FixedPointPair::from_biguint(&value)
}

/// Format base units as a decimal string, trimming trailing zeros.
pub fn format_amount(amount: &BigUint, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = BigUint::from(10u8).pow(decimals as u32);
    let whole = amount / &divisor;
    let remainder = amount % &divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
}

/// Convert a raw integer amount (decimal or `0x` hex string) to a float.
pub fn fixed_point_to_f64(raw: &str, decimals: u8) -> Result<f64, AmountError> {
    let trimmed = raw.trim();
    let value = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(trimmed.as_bytes(), 10),
    }
    .ok_or_else(|| AmountError::InvalidFormat(format!("`{trimmed}` is not an integer")))?;

    format_amount(&value, decimals)
        .parse()
        .map_err(|_| AmountError::InvalidFormat(format!("`{trimmed}` is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn twelve_and_a_half_usdc() {
        let pair = normalize_amount("12.5", 6).unwrap();
        assert_eq!(pair, FixedPointPair { low: 12_500_000, high: 0 });
        assert_eq!(pair.to_calldata(), [Felt::from(12_500_000u64), Felt::ZERO]);
    }

    #[test]
    fn whole_amount_with_eighteen_decimals() {
        let pair = normalize_amount("1", 18).unwrap();
        assert_eq!(pair.low, 1_000_000_000_000_000_000);
    }

    #[test]
    fn fraction_is_truncated_not_rounded() {
        let pair = normalize_amount("1.9999999", 6).unwrap();
        assert_eq!(pair.low, 1_999_999);

        let pair = normalize_amount("0.0000009", 6).unwrap();
        assert!(pair.is_zero());
    }

    #[test]
    fn empty_parts_are_zero() {
        assert_eq!(normalize_amount("5.", 2).unwrap().low, 500);
        assert_eq!(normalize_amount(".5", 2).unwrap().low, 50);
        assert_eq!(normalize_amount(" 7 ", 0).unwrap().low, 7);
    }

    #[test]
    fn rejects_invalid_amounts() {
        assert_eq!(normalize_amount("", 6), Err(AmountError::Empty));
        assert_eq!(normalize_amount("-1", 6), Err(AmountError::Negative));
        assert!(matches!(
            normalize_amount("1.2.3", 6),
            Err(AmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_amount("1e6", 6),
            Err(AmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_amount("+1", 6),
            Err(AmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_amount(".", 6),
            Err(AmountError::InvalidFormat(_))
        ));
    }

    #[test]
    fn splits_into_high_limb() {
        // 2^128 base units
        let pair = normalize_amount("340282366920938463463374607431768211456", 0).unwrap();
        assert_eq!(pair, FixedPointPair { low: 0, high: 1 });
        assert_eq!(
            pair.to_biguint().to_string(),
            "340282366920938463463374607431768211456"
        );
    }

    #[test]
    fn rejects_values_above_u256() {
        let too_big = format!("1{}", "0".repeat(78));
        assert_eq!(normalize_amount(&too_big, 0), Err(AmountError::Overflow));
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(&BigUint::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(&BigUint::from(1_000_000u64), 6), "1");
        assert_eq!(format_amount(&BigUint::from(5u64), 6), "0.000005");
        assert_eq!(format_amount(&BigUint::zero(), 18), "0");
    }

    #[test]
    fn converts_raw_values_to_float() {
        assert_eq!(fixed_point_to_f64("12500000", 6).unwrap(), 12.5);
        assert_eq!(fixed_point_to_f64("0xbebc20", 6).unwrap(), 12.5);
        assert!(fixed_point_to_f64("abc", 6).is_err());
    }

    proptest! {
        #[test]
        fn normalize_then_format_recovers_truncated_input(
            whole in 0u64..1_000_000_000,
            fraction in "[0-9]{0,24}",
            decimals in 0u8..=18,
        ) {
            let input = format!("{whole}.{fraction}");
            let pair = normalize_amount(&input, decimals).unwrap();

            let kept: String = fraction.chars().take(decimals as usize).collect();
            let kept = kept.trim_end_matches('0');
            let expected = if kept.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{kept}")
            };
            prop_assert_eq!(format_amount(&pair.to_biguint(), decimals), expected);
        }

        #[test]
        fn display_value_is_within_one_unit(
            whole in 0u32..1_000_000,
            fraction in "[0-9]{0,12}",
            decimals in 0u8..=8,
        ) {
            let input = format!("{whole}.{fraction}");
            let expected: f64 = format!("{whole}.{fraction}0").parse().unwrap();
            let display = normalize_amount(&input, decimals).unwrap().to_display(decimals);

            let unit = 10f64.powi(-(decimals as i32));
            prop_assert!((expected - display) >= -1e-9);
            prop_assert!((expected - display) < unit + 1e-9);
        }
    }
}
