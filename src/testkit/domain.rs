//! Builders for domain primitives and a seeded two-market world.
//!
//! The world mirrors mainnet: HYPE (gas asset, index 150) and USDT0 (index 268) each
//! trade against USDC (index 0).

use alloy_primitives::{address, Address};
use rust_decimal::Decimal;

use super::chain::InMemoryChain;
use crate::domain::token::{WRAPPED_GAS_TOKEN, USDC_TOKEN_INDEX};
use crate::domain::{TargetConfig, TokenConfig, TokenInfo};

pub const HYPE_INDEX: u32 = 150;
pub const USDT0_INDEX: u32 = 268;
pub const HYPE_SPOT: u32 = 107;
pub const USDT0_SPOT: u32 = 166;

pub const USDT0: Address = address!("0xb8ce59fc3717ada4c02eadf9682a9e934f625ebb");
pub const VAULT: Address = address!("0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d");

/// Token metadata with the given precision and markets.
pub fn token_info(
    name: &str,
    sz_decimals: u8,
    wei_decimals: u8,
    evm_extra_wei_decimals: i8,
    spot_markets: &[u64],
    evm_contract: Address,
) -> TokenInfo {
    TokenInfo {
        name: name.to_string(),
        spot_market_indices: spot_markets.to_vec(),
        deployer_trading_fee_share: 0,
        deployer: Address::ZERO,
        evm_contract,
        sz_decimals,
        wei_decimals,
        evm_extra_wei_decimals,
    }
}

pub fn token(symbol: &str, address: Address) -> TokenConfig {
    TokenConfig {
        symbol: symbol.to_string(),
        address,
    }
}

/// WHYPE/USDT0 vault at [`VAULT`].
pub fn target(threshold_percent: Decimal, min_trade_usd: Decimal, statistical_arb: bool) -> TargetConfig {
    TargetConfig {
        vault_name: "alpha".to_string(),
        vault_address: VAULT,
        base_token: token("WHYPE", WRAPPED_GAS_TOKEN),
        quote_token: token("USDT0", USDT0),
        drift_threshold_percent: threshold_percent,
        min_trade_value_usd: min_trade_usd,
        statistical_arb,
    }
}

/// Raw spot price of a token with `sz_decimals` for a whole-dollar price.
pub fn raw_px(usd: u64, sz_decimals: u8) -> u64 {
    usd * 10u64.pow(8 - u32::from(sz_decimals))
}

/// List USDC, HYPE and USDT0 with their USDC markets.
pub fn seed_markets(chain: &InMemoryChain, hype_usd: u64) {
    chain.list_token(
        USDC_TOKEN_INDEX,
        Address::ZERO,
        token_info("USDC", 8, 8, 0, &[], Address::ZERO),
    );
    chain.list_token(
        HYPE_INDEX,
        Address::ZERO,
        token_info("HYPE", 2, 8, 10, &[u64::from(HYPE_SPOT)], Address::ZERO),
    );
    chain.list_token(
        USDT0_INDEX,
        USDT0,
        token_info("USDT0", 2, 8, -2, &[u64::from(USDT0_SPOT)], USDT0),
    );
    chain.list_spot(
        HYPE_SPOT,
        "@107",
        [u64::from(HYPE_INDEX), u64::from(USDC_TOKEN_INDEX)],
        raw_px(hype_usd, 2),
    );
    chain.list_spot(
        USDT0_SPOT,
        "@166",
        [u64::from(USDT0_INDEX), u64::from(USDC_TOKEN_INDEX)],
        raw_px(1, 2),
    );
    chain.set_decimals(WRAPPED_GAS_TOKEN, 18);
    chain.set_decimals(USDT0, 6);
}
