//! Amount conversions between the three decimal systems in play.
//!
//! - HyperEVM amounts use the ERC-20 contract's decimals.
//! - Core "wei" uses the token's `wei_decimals`; the offset between the two is
//!   `evm_extra_wei_decimals` (signed).
//! - Core "sz" units use the token's `sz_decimals`, the precision the order book accepts.
//!
//! Orders and USD values are encoded as 8-decimal fixed point.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

/// Fixed-point decimals of order prices and sizes on the write gateway.
pub const ORDER_DECIMALS: u32 = 8;

/// Fixed-point decimals of every USD value in the crate.
pub const USD_DECIMALS: u32 = 8;

/// Precision of the native gas asset on HyperEVM (18) minus its Core precision (8).
pub const GAS_ASSET_EXTRA_WEI_DECIMALS: u32 = 10;

/// Maximum decimals a spot price may carry before `sz_decimals` is subtracted.
pub const MAX_SPOT_PRICE_DECIMALS: u32 = 8;

/// `10^exp` as a `U256`.
#[must_use]
pub fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// HyperEVM amount to Core wei. Floors when the EVM side carries more precision.
#[must_use]
pub fn evm_to_wei(amount: U256, evm_extra_wei_decimals: i8) -> U256 {
    match evm_extra_wei_decimals.cmp(&0) {
        Ordering::Greater => amount / pow10(evm_extra_wei_decimals.unsigned_abs().into()),
        Ordering::Less => amount.saturating_mul(pow10(evm_extra_wei_decimals.unsigned_abs().into())),
        Ordering::Equal => amount,
    }
}

/// Core wei to HyperEVM amount. Exact inverse of [`evm_to_wei`] up to its flooring.
#[must_use]
pub fn wei_to_evm(wei: U256, evm_extra_wei_decimals: i8) -> U256 {
    match evm_extra_wei_decimals.cmp(&0) {
        Ordering::Greater => wei.saturating_mul(pow10(evm_extra_wei_decimals.unsigned_abs().into())),
        Ordering::Less => wei / pow10(evm_extra_wei_decimals.unsigned_abs().into()),
        Ordering::Equal => wei,
    }
}

/// Core wei to whole sz units (flooring).
#[must_use]
pub fn wei_to_sz(wei: U256, wei_decimals: u8, sz_decimals: u8) -> U256 {
    wei / pow10(u32::from(wei_decimals.saturating_sub(sz_decimals)))
}

/// Whole sz units to Core wei.
#[must_use]
pub fn sz_to_wei(sz: U256, wei_decimals: u8, sz_decimals: u8) -> U256 {
    sz.saturating_mul(pow10(u32::from(wei_decimals.saturating_sub(sz_decimals))))
}

/// Drop every digit past `decimals` without rounding.
#[must_use]
pub fn truncate(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}

/// Fixed-point integer to `Decimal`. Saturates at the `Decimal` range.
#[must_use]
pub fn to_decimal(amount: U256, decimals: u32) -> Decimal {
    let mantissa = u128::try_from(amount).unwrap_or(u128::MAX);
    let scale = decimals.min(28);
    let value = i128::try_from(mantissa)
        .ok()
        .and_then(|m| Decimal::try_from_i128_with_scale(m, scale).ok())
        .unwrap_or(Decimal::MAX);
    if decimals > scale {
        value / decimal_pow10(decimals - scale)
    } else {
        value
    }
}

/// `Decimal` to fixed-point integer, truncating past `decimals`.
/// Negative or out-of-range values yield `None`.
#[must_use]
pub fn from_decimal(value: Decimal, decimals: u32) -> Option<U256> {
    if value.is_sign_negative() {
        return None;
    }
    let scaled = value.checked_mul(decimal_pow10(decimals))?;
    scaled.trunc().to_u128().map(U256::from)
}

/// 8-decimal USD fixed point to `Decimal`.
#[must_use]
pub fn usd(value: U256) -> Decimal {
    to_decimal(value, USD_DECIMALS)
}

fn decimal_pow10(exp: u32) -> Decimal {
    (0..exp).fold(Decimal::ONE, |acc, _| acc * Decimal::TEN)
}

/// Tick-size policy of the spot order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceClass {
    /// BTC and ETH: six significant digits.
    Major,
    /// HYPE and SOL: five significant digits.
    Standard,
    /// Everything else: `8 - sz_decimals` decimal places.
    Other,
}

impl PriceClass {
    /// Classify a Core token by its name. Unit-wrapped names (`UBTC`, `USOL`) map to the
    /// underlying asset.
    #[must_use]
    pub fn for_token(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "BTC" | "UBTC" | "ETH" | "UETH" => Self::Major,
            "HYPE" | "WHYPE" | "SOL" | "USOL" => Self::Standard,
            _ => Self::Other,
        }
    }
}

/// Format a limit price the way the order book accepts it.
#[must_use]
pub fn format_price(price: Decimal, class: PriceClass, sz_decimals: u8) -> Decimal {
    match class {
        PriceClass::Major => round_significant(price, 6),
        PriceClass::Standard => round_significant(price, 5),
        PriceClass::Other => price.round_dp_with_strategy(
            MAX_SPOT_PRICE_DECIMALS.saturating_sub(u32::from(sz_decimals)),
            RoundingStrategy::MidpointAwayFromZero,
        ),
    }
}

/// Round to `digits` significant digits, half away from zero.
#[must_use]
pub fn round_significant(value: Decimal, digits: u32) -> Decimal {
    if value.is_zero() || digits == 0 {
        return Decimal::ZERO;
    }
    let magnitude = magnitude(value.abs());
    let places = i64::from(digits) - 1 - magnitude;
    if places >= 0 {
        value
            .round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    } else {
        let factor = decimal_pow10(places.unsigned_abs() as u32);
        ((value / factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * factor)
            .normalize()
    }
}

/// `floor(log10(value))` for a positive value.
fn magnitude(value: Decimal) -> i64 {
    let mut magnitude = 0i64;
    let mut v = value;
    while v >= Decimal::TEN {
        v /= Decimal::TEN;
        magnitude += 1;
    }
    while v < Decimal::ONE {
        v *= Decimal::TEN;
        magnitude -= 1;
    }
    magnitude
}

/// Limit price after the slippage allowance: 1% under market to sell, 1% over to buy.
#[must_use]
pub fn apply_slippage(price: Decimal, is_buy: bool) -> Decimal {
    let tolerance = Decimal::new(1, 2);
    if is_buy {
        price * (Decimal::ONE + tolerance)
    } else {
        price * (Decimal::ONE - tolerance)
    }
}

/// Order size truncated to the asset's native precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSize {
    /// Human-readable size, at most `sz_decimals` decimals.
    pub size: Decimal,
    /// Whole sz units.
    pub sz_units: U256,
    /// `size` scaled to the 8-decimal order encoding.
    pub encoded: u64,
}

impl OrderSize {
    /// Size an order from a Core wei amount.
    #[must_use]
    pub fn from_wei(wei: U256, wei_decimals: u8, sz_decimals: u8) -> Option<Self> {
        let size = truncate(to_decimal(wei, wei_decimals.into()), sz_decimals.into());
        Self::from_size(size, sz_decimals)
    }

    /// Size an order from a human-readable amount.
    #[must_use]
    pub fn from_size(size: Decimal, sz_decimals: u8) -> Option<Self> {
        let size = truncate(size, sz_decimals.into());
        let sz_units = from_decimal(size, sz_decimals.into())?;
        let encoded = from_decimal(size, ORDER_DECIMALS)?;
        Some(Self {
            size,
            sz_units,
            encoded: u64::try_from(encoded).ok()?,
        })
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.encoded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const AMOUNTS: [u64; 8] = [0, 1, 7, 999, 1_000_000, 123_456_789, 10_000_000_000, u64::MAX];

    #[test]
    fn wei_round_trip_is_exact_for_non_positive_offsets() {
        for extra in -4i8..=0 {
            for amount in AMOUNTS {
                let amount = U256::from(amount);
                assert_eq!(wei_to_evm(evm_to_wei(amount, extra), extra), amount);
            }
        }
    }

    #[test]
    fn wei_round_trip_floors_for_positive_offsets() {
        for extra in 1i8..=12 {
            let unit = pow10(extra as u32);
            for amount in AMOUNTS {
                let amount = U256::from(amount);
                let expected = amount / unit * unit;
                assert_eq!(wei_to_evm(evm_to_wei(amount, extra), extra), expected);
            }
        }
    }

    #[test]
    fn evm_to_wei_shifts_by_offset() {
        assert_eq!(evm_to_wei(U256::from(1_500_000_000_000_000_000u128), 10), U256::from(150_000_000u64));
        assert_eq!(evm_to_wei(U256::from(15u64), -2), U256::from(1500u64));
        assert_eq!(evm_to_wei(U256::from(15u64), 0), U256::from(15u64));
    }

    #[test]
    fn sz_conversions_use_precision_gap() {
        // 8 wei decimals, 2 sz decimals: 1.23456789 -> 123 sz units
        assert_eq!(wei_to_sz(U256::from(123_456_789u64), 8, 2), U256::from(123u64));
        assert_eq!(sz_to_wei(U256::from(123u64), 8, 2), U256::from(123_000_000u64));
    }

    #[test]
    fn truncate_never_rounds_up_and_is_idempotent() {
        for value in [dec!(0), dec!(1.999), dec!(0.123456789), dec!(42.5), dec!(1000000.00001)] {
            for decimals in 0..=8 {
                let once = truncate(value, decimals);
                assert!(once <= value);
                assert_eq!(truncate(once, decimals), once);
            }
        }
        assert_eq!(truncate(dec!(1.999), 2), dec!(1.99));
    }

    #[test]
    fn decimal_conversions_handle_scales() {
        assert_eq!(to_decimal(U256::from(123_456_789u64), 8), dec!(1.23456789));
        assert_eq!(from_decimal(dec!(1.23456789), 8), Some(U256::from(123_456_789u64)));
        assert_eq!(from_decimal(dec!(1.5), 0), Some(U256::from(1u64)));
        assert_eq!(from_decimal(dec!(-1), 8), None);
        assert_eq!(usd(U256::from(2_500_000_000u64)), dec!(25));
    }

    #[test]
    fn price_classes_follow_tick_policy() {
        assert_eq!(PriceClass::for_token("UBTC"), PriceClass::Major);
        assert_eq!(PriceClass::for_token("eth"), PriceClass::Major);
        assert_eq!(PriceClass::for_token("HYPE"), PriceClass::Standard);
        assert_eq!(PriceClass::for_token("PURR"), PriceClass::Other);

        assert_eq!(format_price(dec!(97123.456), PriceClass::Major, 5), dec!(97123.5));
        assert_eq!(format_price(dec!(38.123456), PriceClass::Standard, 2), dec!(38.123));
        assert_eq!(format_price(dec!(0.123456789), PriceClass::Other, 0), dec!(0.12345679));
        assert_eq!(format_price(dec!(0.123456789), PriceClass::Other, 3), dec!(0.12346));
    }

    #[test]
    fn significant_rounding_above_digit_count() {
        assert_eq!(round_significant(dec!(1234567), 6), dec!(1234570));
        assert_eq!(round_significant(dec!(0.000123456), 5), dec!(0.00012346));
        assert_eq!(round_significant(Decimal::ZERO, 5), Decimal::ZERO);
    }

    #[test]
    fn slippage_moves_price_against_us() {
        assert_eq!(apply_slippage(dec!(100), true), dec!(101));
        assert_eq!(apply_slippage(dec!(100), false), dec!(99));
    }

    #[test]
    fn order_size_truncates_to_native_precision() {
        // 1.23456789 with 2 sz decimals
        let size = OrderSize::from_wei(U256::from(123_456_789u64), 8, 2).unwrap();
        assert_eq!(size.size, dec!(1.23));
        assert_eq!(size.sz_units, U256::from(123u64));
        assert_eq!(size.encoded, 123_000_000);

        let dust = OrderSize::from_wei(U256::from(999_999u64), 8, 2).unwrap();
        assert!(dust.is_zero());
    }
}
