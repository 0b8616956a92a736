//! Per-vault rebalancing targets and gas limits.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::token::{is_gas_asset, NATIVE_GAS_DECIMALS, WRAPPED_GAS_TOKEN};
use super::units::from_decimal;

/// A token the vault holds, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: Address,
}

/// How a vault is kept in balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// HyperEVM balances only; swap the overweight asset down to 50/50 through USDC.
    StatisticalArb,
    /// Both layers; bridge each token so half of it sits on each layer.
    DualBridge,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatisticalArb => write!(f, "statistical_arb"),
            Self::DualBridge => write!(f, "dual_bridge"),
        }
    }
}

/// Configuration of a single vault.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub vault_name: String,
    pub vault_address: Address,
    pub base_token: TokenConfig,
    pub quote_token: TokenConfig,
    /// Minimum allocation, in percent, either side may fall to before rebalancing.
    pub drift_threshold_percent: Decimal,
    /// Smallest trade worth executing, in USD.
    pub min_trade_value_usd: Decimal,
    #[serde(default)]
    pub statistical_arb: bool,
}

impl TargetConfig {
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        if self.statistical_arb {
            Strategy::StatisticalArb
        } else {
            Strategy::DualBridge
        }
    }

    /// Whether either configured token is the wrapped gas asset.
    #[must_use]
    pub fn uses_wrapped_gas_asset(&self) -> bool {
        self.base_token.address == WRAPPED_GAS_TOKEN || self.quote_token.address == WRAPPED_GAS_TOKEN
    }

    /// Whether either configured token is the gas asset in any form.
    #[must_use]
    pub fn uses_gas_asset(&self) -> bool {
        is_gas_asset(self.base_token.address) || is_gas_asset(self.quote_token.address)
    }

    /// `"name-0x1a2b3c"`, used as a log label.
    #[must_use]
    pub fn label(&self) -> String {
        let address = format!("{:#x}", self.vault_address);
        format!("{}-{}", self.vault_name, &address[..8])
    }
}

/// Gas limits applied to every rebalancing run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasConfig {
    /// Rebalancing is skipped above this gas price.
    pub max_gas_price_gwei: Decimal,
    /// Native gas asset to keep unwrapped for fees, in whole tokens.
    #[serde(default)]
    pub gas_reserve: Decimal,
}

impl GasConfig {
    /// Gas reserve in native 18-decimal units.
    #[must_use]
    pub fn reserve_wei(&self) -> U256 {
        from_decimal(self.gas_reserve, NATIVE_GAS_DECIMALS.into()).unwrap_or(U256::ZERO)
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_gas_price_gwei: Decimal::from(50),
            gas_reserve: Decimal::new(1, 1),
        }
    }
}
