//! Portfolio valuation across the two layers.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::token::TokenBalance;
use super::units::usd;

/// Which layers count towards a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layers {
    /// HyperEVM balances only.
    Evm,
    /// HyperEVM plus Core balances.
    Both,
}

/// Valuation of a vault's base/quote pair at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub base: TokenBalance,
    pub quote: TokenBalance,
    /// 8-decimal fixed point.
    pub total_value_usd: U256,
    pub base_allocation_percent: Decimal,
    pub quote_allocation_percent: Decimal,
    pub layers: Layers,
    pub timestamp: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Derive totals and allocations from the two balances.
    #[must_use]
    pub fn new(base: TokenBalance, quote: TokenBalance, layers: Layers, timestamp: DateTime<Utc>) -> Self {
        let total_value_usd = base.value_usd.saturating_add(quote.value_usd);
        let (base_allocation_percent, quote_allocation_percent) =
            allocations(base.value_usd, total_value_usd);
        Self {
            base,
            quote,
            total_value_usd,
            base_allocation_percent,
            quote_allocation_percent,
            layers,
            timestamp,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_value_usd.is_zero()
    }

    /// Total value as a `Decimal` in dollars.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        usd(self.total_value_usd)
    }
}

/// Base and quote allocation percentages, 2 dp, summing to 100 (both 0 when empty).
fn allocations(base_value: U256, total_value: U256) -> (Decimal, Decimal) {
    if total_value.is_zero() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let base = (usd(base_value) / usd(total_value) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (base, Decimal::ONE_HUNDRED - base)
}
