//! Token metadata, balances and the fixed addresses that identify them.

use alloy_primitives::{address, Address, U256};
use serde::Serialize;

use super::units::{pow10, USD_DECIMALS};

/// Marker address used for the native gas asset (HYPE). Equal to its system address.
pub const NATIVE_GAS_TOKEN: Address = address!("0x2222222222222222222222222222222222222222");

/// Wrapped form of the gas asset (WHYPE).
pub const WRAPPED_GAS_TOKEN: Address = address!("0x5555555555555555555555555555555555555555");

/// System address receiving native gas asset transfers bound for Core.
pub const GAS_ASSET_SYSTEM_ADDRESS: Address = NATIVE_GAS_TOKEN;

/// Base of every other token's system address; the token index is added to it.
pub const SYSTEM_ADDRESS_BASE: Address = address!("0x2000000000000000000000000000000000000000");

/// Core index of USDC, the quote leg of every USD spot market.
pub const USDC_TOKEN_INDEX: u32 = 0;

/// ERC-20 decimals assumed when the contract cannot be read.
pub const DEFAULT_EVM_DECIMALS: u8 = 18;

/// Decimals of the native gas asset on HyperEVM.
pub const NATIVE_GAS_DECIMALS: u8 = 18;

/// Gas asset index on Core, which differs per network.
#[must_use]
pub fn gas_asset_index(chain_id: u64) -> Option<u32> {
    match chain_id {
        999 => Some(150),
        998 => Some(1105),
        _ => None,
    }
}

/// Whether the address designates the gas asset in either form.
#[must_use]
pub fn is_gas_asset(token: Address) -> bool {
    token == NATIVE_GAS_TOKEN || token == WRAPPED_GAS_TOKEN
}

/// System address bridging `token_index` between the layers.
#[must_use]
pub fn system_address(token_index: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(SYSTEM_ADDRESS_BASE.as_slice());
    bytes[16..].copy_from_slice(&token_index.to_be_bytes());
    Address::from(bytes)
}

/// Token metadata from the token info precompile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub spot_market_indices: Vec<u64>,
    pub deployer_trading_fee_share: u64,
    pub deployer: Address,
    pub evm_contract: Address,
    /// Order size precision.
    pub sz_decimals: u8,
    /// Core internal precision.
    pub wei_decimals: u8,
    /// HyperEVM decimals minus `wei_decimals`.
    pub evm_extra_wei_decimals: i8,
}

/// Core spot balance record, amounts in Core wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpotBalance {
    pub total: u64,
    pub hold: u64,
    pub entry_notional: u64,
}

/// Spot market metadata: name and the `[base, quote]` token indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotInfo {
    pub name: String,
    pub tokens: [u64; 2],
}

impl SpotInfo {
    #[must_use]
    pub fn is_usd_market(&self) -> bool {
        self.tokens[1] == u64::from(USDC_TOKEN_INDEX)
    }
}

/// Balance of one token across both layers, in HyperEVM units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    evm_balance: U256,
    core_balance: U256,
    total_balance: U256,
    decimals: u8,
}

impl WalletBalance {
    #[must_use]
    pub fn new(evm_balance: U256, core_balance: U256, decimals: u8) -> Self {
        Self {
            evm_balance,
            core_balance,
            total_balance: evm_balance.saturating_add(core_balance),
            decimals,
        }
    }

    /// Balance held on HyperEVM only.
    #[must_use]
    pub fn evm_only(evm_balance: U256, decimals: u8) -> Self {
        Self::new(evm_balance, U256::ZERO, decimals)
    }

    #[must_use]
    pub fn evm_balance(&self) -> U256 {
        self.evm_balance
    }

    #[must_use]
    pub fn core_balance(&self) -> U256 {
        self.core_balance
    }

    #[must_use]
    pub fn total_balance(&self) -> U256 {
        self.total_balance
    }

    #[must_use]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Wallet balance valued in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub token: Address,
    pub balance: WalletBalance,
    /// 8-decimal fixed point.
    pub price_usd: U256,
    /// 8-decimal fixed point.
    pub value_usd: U256,
}

impl TokenBalance {
    #[must_use]
    pub fn new(token: Address, balance: WalletBalance, price_usd: U256) -> Self {
        let value_usd =
            balance.total_balance().saturating_mul(price_usd) / pow10(balance.decimals().into());
        Self {
            token,
            balance,
            price_usd,
            value_usd,
        }
    }

    /// Price known and non-zero.
    #[must_use]
    pub fn has_price(&self) -> bool {
        !self.price_usd.is_zero()
    }

    /// USD value of `amount` of this token, 8-decimal fixed point.
    #[must_use]
    pub fn value_of(&self, amount: U256) -> U256 {
        amount.saturating_mul(self.price_usd) / pow10(self.balance.decimals().into())
    }

    /// Token amount worth `value_usd` (8-decimal fixed point), floored.
    #[must_use]
    pub fn amount_for_value(&self, value_usd: U256) -> U256 {
        if self.price_usd.is_zero() {
            return U256::ZERO;
        }
        value_usd.saturating_mul(pow10(self.balance.decimals().into())) / self.price_usd
    }
}

/// `1.0` USD in 8-decimal fixed point.
#[must_use]
pub fn one_usd() -> U256 {
    pow10(USD_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_address_offsets_base_by_index() {
        assert_eq!(
            system_address(0),
            address!("0x2000000000000000000000000000000000000000")
        );
        assert_eq!(
            system_address(200),
            address!("0x20000000000000000000000000000000000000c8")
        );
        assert_eq!(
            system_address(0x0102_0304),
            address!("0x2000000000000000000000000000000001020304")
        );
    }

    #[test]
    fn gas_asset_forms_are_recognised() {
        assert!(is_gas_asset(NATIVE_GAS_TOKEN));
        assert!(is_gas_asset(WRAPPED_GAS_TOKEN));
        assert!(!is_gas_asset(Address::ZERO));
        assert_eq!(gas_asset_index(999), Some(150));
        assert_eq!(gas_asset_index(998), Some(1105));
        assert_eq!(gas_asset_index(1), None);
    }

    #[test]
    fn total_is_sum_of_layers() {
        let balance = WalletBalance::new(U256::from(80u64), U256::from(20u64), 6);
        assert_eq!(balance.total_balance(), U256::from(100u64));
    }

    #[test]
    fn value_is_eight_decimal_usd_regardless_of_token_decimals() {
        // 2.5 tokens of a 6-decimal asset at $4.00
        let six = TokenBalance::new(
            Address::ZERO,
            WalletBalance::evm_only(U256::from(2_500_000u64), 6),
            U256::from(400_000_000u64),
        );
        assert_eq!(six.value_usd, U256::from(1_000_000_000u64));

        // 2.5 tokens of an 18-decimal asset at $4.00
        let eighteen = TokenBalance::new(
            Address::ZERO,
            WalletBalance::evm_only(U256::from(2_500_000_000_000_000_000u128), 18),
            U256::from(400_000_000u64),
        );
        assert_eq!(eighteen.value_usd, six.value_usd);
        assert_eq!(
            eighteen.amount_for_value(U256::from(400_000_000u64)),
            U256::from(1_000_000_000_000_000_000u128)
        );
    }
}
