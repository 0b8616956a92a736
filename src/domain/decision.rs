//! Drift detection and the rebalancing plans derived from a snapshot.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use super::portfolio::PortfolioSnapshot;
use super::target::{Strategy, TargetConfig};
use super::token::{TokenBalance, WalletBalance};
use super::units::{from_decimal, usd, USD_DECIMALS};

/// Allocation observed when the decision was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub base_percent: Decimal,
    pub quote_percent: Decimal,
    pub threshold_percent: Decimal,
}

/// Why no rebalance is needed or possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Both sides at or above the threshold.
    WithinThreshold,
    /// Nothing of value held.
    EmptyPortfolio,
    /// The price of the asset to sell could not be read.
    PriceUnavailable { token: Address },
    /// The computed sell amount exceeds what sits on HyperEVM.
    InsufficientBalance { required: U256, available: U256 },
    /// The trade is worth less than the configured minimum.
    BelowMinimumTradeValue { value: Decimal, minimum: Decimal },
    /// Every bridge direction came out at zero.
    NothingToBridge,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithinThreshold => write!(f, "allocation within threshold"),
            Self::EmptyPortfolio => write!(f, "portfolio value is zero"),
            Self::PriceUnavailable { token } => write!(f, "no price for {token}"),
            Self::InsufficientBalance {
                required,
                available,
            } => write!(f, "insufficient balance: need {required}, have {available}"),
            Self::BelowMinimumTradeValue { value, minimum } => {
                write!(f, "trade value ${value} below minimum ${minimum}")
            }
            Self::NothingToBridge => write!(f, "nothing to bridge"),
        }
    }
}

/// Sell the overweight asset down to 50/50 through USDC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPlan {
    pub token_to_sell: Address,
    pub token_to_buy: Address,
    /// HyperEVM units of `token_to_sell`.
    pub amount_to_rebalance: U256,
    /// 8-decimal fixed point.
    pub expected_value_usd: U256,
}

/// Bridge amounts putting half of each token on each layer, in HyperEVM units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgePlan {
    pub base_token: Address,
    pub quote_token: Address,
    pub base_to_core: U256,
    pub base_to_evm: U256,
    pub quote_to_core: U256,
    pub quote_to_evm: U256,
    /// Value of all legs, 8-decimal fixed point.
    pub total_value_usd: U256,
}

impl BridgePlan {
    /// Legs with a positive amount, in execution order.
    #[must_use]
    pub fn legs(&self) -> Vec<BridgeLeg> {
        [
            BridgeLeg::new(self.base_token, LegDirection::ToCore, self.base_to_core),
            BridgeLeg::new(self.base_token, LegDirection::ToEvm, self.base_to_evm),
            BridgeLeg::new(self.quote_token, LegDirection::ToCore, self.quote_to_core),
            BridgeLeg::new(self.quote_token, LegDirection::ToEvm, self.quote_to_evm),
        ]
        .into_iter()
        .filter(|leg| !leg.amount.is_zero())
        .collect()
    }
}

/// Direction of one bridge leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegDirection {
    ToCore,
    ToEvm,
}

/// One transfer of a bridge plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeLeg {
    pub token: Address,
    pub direction: LegDirection,
    pub amount: U256,
}

impl BridgeLeg {
    fn new(token: Address, direction: LegDirection, amount: U256) -> Self {
        Self {
            token,
            direction,
            amount,
        }
    }
}

/// Outcome of drift analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RebalanceDecision {
    None {
        allocation: Allocation,
        reason: SkipReason,
    },
    StatisticalArb {
        allocation: Allocation,
        plan: SwapPlan,
    },
    DualBridge {
        allocation: Allocation,
        plan: BridgePlan,
    },
}

impl RebalanceDecision {
    #[must_use]
    pub fn needs_rebalance(&self) -> bool {
        !matches!(self, Self::None { .. })
    }

    #[must_use]
    pub fn allocation(&self) -> &Allocation {
        match self {
            Self::None { allocation, .. }
            | Self::StatisticalArb { allocation, .. }
            | Self::DualBridge { allocation, .. } => allocation,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::None { .. } => None,
            Self::StatisticalArb { .. } => Some(Strategy::StatisticalArb),
            Self::DualBridge { .. } => Some(Strategy::DualBridge),
        }
    }
}

/// Decide with the target's configured strategy.
#[must_use]
pub fn decide(snapshot: &PortfolioSnapshot, target: &TargetConfig) -> RebalanceDecision {
    match target.strategy() {
        Strategy::StatisticalArb => decide_statistical_arb(snapshot, target),
        Strategy::DualBridge => decide_dual_bridge(snapshot, target),
    }
}

fn allocation(snapshot: &PortfolioSnapshot, target: &TargetConfig) -> Allocation {
    Allocation {
        base_percent: snapshot.base_allocation_percent,
        quote_percent: snapshot.quote_allocation_percent,
        threshold_percent: target.drift_threshold_percent,
    }
}

/// Held but unpriced: its value is unknown, not zero.
fn unpriced_holding(snapshot: &PortfolioSnapshot) -> Option<Address> {
    [&snapshot.base, &snapshot.quote]
        .into_iter()
        .find(|token| !token.balance.total_balance().is_zero() && !token.has_price())
        .map(|token| token.token)
}

/// `None` when the snapshot does not call for action at all.
fn drift_gate(snapshot: &PortfolioSnapshot, allocation: Allocation) -> Option<RebalanceDecision> {
    if let Some(token) = unpriced_holding(snapshot) {
        return Some(RebalanceDecision::None {
            allocation,
            reason: SkipReason::PriceUnavailable { token },
        });
    }
    if snapshot.is_empty() {
        return Some(RebalanceDecision::None {
            allocation,
            reason: SkipReason::EmptyPortfolio,
        });
    }
    let threshold = allocation.threshold_percent;
    if allocation.base_percent >= threshold && allocation.quote_percent >= threshold {
        return Some(RebalanceDecision::None {
            allocation,
            reason: SkipReason::WithinThreshold,
        });
    }
    None
}

/// Statistical arbitrage: sell the overweight side's excess over half the portfolio.
///
/// The sell amount is floored, so the realised trade never exceeds the excess value.
#[must_use]
pub fn decide_statistical_arb(snapshot: &PortfolioSnapshot, target: &TargetConfig) -> RebalanceDecision {
    let allocation = allocation(snapshot, target);
    if let Some(decision) = drift_gate(snapshot, allocation) {
        return decision;
    }

    let (sell, buy) = if snapshot.base_allocation_percent > snapshot.quote_allocation_percent {
        (&snapshot.base, &snapshot.quote)
    } else {
        (&snapshot.quote, &snapshot.base)
    };

    let half = snapshot.total_value_usd / U256::from(2u8);
    let excess_value = sell.value_usd.saturating_sub(half);
    let amount = sell.amount_for_value(excess_value);
    let available = sell.balance.evm_balance();
    if amount > available {
        return RebalanceDecision::None {
            allocation,
            reason: SkipReason::InsufficientBalance {
                required: amount,
                available,
            },
        };
    }

    let expected_value_usd = sell.value_of(amount);
    if let Some(reason) = below_minimum(expected_value_usd, target.min_trade_value_usd) {
        return RebalanceDecision::None { allocation, reason };
    }

    RebalanceDecision::StatisticalArb {
        allocation,
        plan: SwapPlan {
            token_to_sell: sell.token,
            token_to_buy: buy.token,
            amount_to_rebalance: amount,
            expected_value_usd,
        },
    }
}

/// Dual bridge: move each token's per-layer excess over half its total to the other layer.
#[must_use]
pub fn decide_dual_bridge(snapshot: &PortfolioSnapshot, target: &TargetConfig) -> RebalanceDecision {
    let allocation = allocation(snapshot, target);
    if let Some(decision) = drift_gate(snapshot, allocation) {
        return decision;
    }

    let (base_to_core, base_to_evm) = layer_split(&snapshot.base.balance);
    let (quote_to_core, quote_to_evm) = layer_split(&snapshot.quote.balance);

    let total_value_usd = leg_value(&snapshot.base, base_to_core, base_to_evm)
        .saturating_add(leg_value(&snapshot.quote, quote_to_core, quote_to_evm));

    let plan = BridgePlan {
        base_token: snapshot.base.token,
        quote_token: snapshot.quote.token,
        base_to_core,
        base_to_evm,
        quote_to_core,
        quote_to_evm,
        total_value_usd,
    };

    if plan.legs().is_empty() {
        return RebalanceDecision::None {
            allocation,
            reason: SkipReason::NothingToBridge,
        };
    }
    if let Some(reason) = below_minimum(total_value_usd, target.min_trade_value_usd) {
        return RebalanceDecision::None { allocation, reason };
    }

    RebalanceDecision::DualBridge { allocation, plan }
}

/// `(to_core, to_evm)` moving a balance to half on each layer.
#[must_use]
pub fn layer_split(balance: &WalletBalance) -> (U256, U256) {
    let target = balance.total_balance() / U256::from(2u8);
    (
        balance.evm_balance().saturating_sub(target),
        balance.core_balance().saturating_sub(target),
    )
}

fn leg_value(token: &TokenBalance, to_core: U256, to_evm: U256) -> U256 {
    token
        .value_of(to_core)
        .saturating_add(token.value_of(to_evm))
}

fn below_minimum(value_usd: U256, minimum: Decimal) -> Option<SkipReason> {
    let minimum_fixed = from_decimal(minimum, USD_DECIMALS).unwrap_or(U256::ZERO);
    (value_usd < minimum_fixed).then(|| SkipReason::BelowMinimumTradeValue {
        value: usd(value_usd),
        minimum,
    })
}
