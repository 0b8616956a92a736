//! Cross-layer reads and the precision conversions that depend on token metadata.
//!
//! Balance, price and decimals reads degrade to zero (or 18 decimals) with a warning so
//! a snapshot can always be taken. Index, metadata and market lookups feed order
//! construction and return errors instead.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::token::{
    gas_asset_index, is_gas_asset, one_usd, DEFAULT_EVM_DECIMALS, NATIVE_GAS_DECIMALS,
    NATIVE_GAS_TOKEN, USDC_TOKEN_INDEX,
};
use crate::domain::units::{self, pow10, to_decimal};
use crate::domain::{SpotBalance, TokenBalance, TokenInfo, WalletBalance};
use crate::error::{Error, RebalanceError, Result};
use crate::port::{precompile, ChainReader};

/// Gwei per wei exponent.
const GWEI_DECIMALS: u32 = 9;

/// Reads balances, prices and metadata across HyperEVM and Core.
#[derive(Clone)]
pub struct PrecisionReader {
    chain: Arc<dyn ChainReader>,
    chain_id: u64,
}

impl PrecisionReader {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainReader>, chain_id: u64) -> Self {
        Self { chain, chain_id }
    }

    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Core token index. Both forms of the gas asset resolve to the network's gas index.
    pub async fn token_index(&self, token: Address) -> Result<u32> {
        if is_gas_asset(token) {
            return gas_asset_index(self.chain_id)
                .ok_or(RebalanceError::MissingExecutionParameters("gas asset index for chain").into());
        }
        self.chain.token_registry_index(token).await
    }

    /// Core spot balance of `user`, in Core wei.
    pub async fn spot_balance(&self, user: Address, token: Address) -> Result<SpotBalance> {
        let index = self.token_index(token).await?;
        self.spot_balance_at(user, index).await
    }

    /// Core spot balance of `user` for a token index.
    pub async fn spot_balance_at(&self, user: Address, token_index: u32) -> Result<SpotBalance> {
        self.chain
            .spot_balance(user, u64::from(token_index))
            .await
            .map_err(|e| precompile_failure(precompile::SPOT_BALANCE, &e))
    }

    pub async fn token_info(&self, token: Address) -> Result<TokenInfo> {
        let index = self.token_index(token).await?;
        self.token_info_by_index(index).await
    }

    async fn token_info_by_index(&self, index: u32) -> Result<TokenInfo> {
        self.chain
            .token_info(index)
            .await
            .map_err(|e| precompile_failure(precompile::TOKEN_INFO, &e))
    }

    /// Spot market quoting `token` in USDC.
    ///
    /// A token listed in a single market trades there; otherwise the market whose quote
    /// leg is USDC is chosen.
    pub async fn spot_index(&self, token: Address) -> Result<u32> {
        let index = self.token_index(token).await?;
        let info = self.token_info_by_index(index).await?;
        self.usd_market(index, &info).await
    }

    async fn usd_market(&self, token_index: u32, info: &TokenInfo) -> Result<u32> {
        if let [only] = info.spot_market_indices.as_slice() {
            return market_index(*only);
        }
        for &candidate in &info.spot_market_indices {
            let market = market_index(candidate)?;
            let spot = self
                .chain
                .spot_info(market)
                .await
                .map_err(|e| precompile_failure(precompile::SPOT_INFO, &e))?;
            if spot.is_usd_market() {
                debug!(token_index, market, name = %spot.name, "USD market found");
                return Ok(market);
            }
        }
        Err(RebalanceError::NoUsdMarketFound { token_index }.into())
    }

    /// Spot price in 8-decimal USD. USDC itself is worth exactly one dollar.
    pub async fn try_spot_price(&self, token: Address) -> Result<U256> {
        let index = self.token_index(token).await?;
        if index == USDC_TOKEN_INDEX {
            return Ok(one_usd());
        }
        let info = self.token_info_by_index(index).await?;
        let market = self.usd_market(index, &info).await?;
        let raw = self
            .chain
            .spot_px(market)
            .await
            .map_err(|e| precompile_failure(precompile::SPOT_PX, &e))?;
        Ok(U256::from(raw).saturating_mul(pow10(info.sz_decimals.into())))
    }

    /// Spot price in 8-decimal USD, zero when it cannot be read.
    pub async fn spot_price(&self, token: Address) -> U256 {
        match self.try_spot_price(token).await {
            Ok(price) => price,
            Err(e) => {
                warn!(token = %token, error = %e, "Price unavailable, valuing at zero");
                U256::ZERO
            }
        }
    }

    pub async fn core_user_exists(&self, user: Address) -> Result<bool> {
        self.chain
            .core_user_exists(user)
            .await
            .map_err(|e| precompile_failure(precompile::CORE_USER_EXISTS, &e))
    }

    /// HyperEVM decimals, 18 when unreadable.
    pub async fn decimals(&self, token: Address) -> u8 {
        if token == NATIVE_GAS_TOKEN {
            return NATIVE_GAS_DECIMALS;
        }
        match self.chain.erc20_decimals(token).await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!(token = %token, error = %e, "Decimals unavailable, assuming 18");
                DEFAULT_EVM_DECIMALS
            }
        }
    }

    /// HyperEVM balance; the native marker reads the account balance.
    pub async fn evm_balance(&self, user: Address, token: Address) -> U256 {
        let balance = if token == NATIVE_GAS_TOKEN {
            self.chain.native_balance(user).await
        } else {
            self.chain.erc20_balance(token, user).await
        };
        balance.unwrap_or_else(|e| {
            warn!(user = %user, token = %token, error = %e, "EVM balance unavailable, using zero");
            U256::ZERO
        })
    }

    /// Core balance converted to HyperEVM units.
    pub async fn core_balance(&self, user: Address, token: Address) -> U256 {
        match self.try_core_balance(user, token).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(user = %user, token = %token, error = %e, "Core balance unavailable, using zero");
                U256::ZERO
            }
        }
    }

    async fn try_core_balance(&self, user: Address, token: Address) -> Result<U256> {
        let index = self.token_index(token).await?;
        let (balance, info) = tokio::try_join!(
            self.spot_balance_at(user, index),
            self.token_info_by_index(index),
        )?;
        Ok(units::wei_to_evm(U256::from(balance.total), info.evm_extra_wei_decimals))
    }

    pub async fn wallet_balance(&self, user: Address, token: Address) -> WalletBalance {
        let (evm, core, decimals) = tokio::join!(
            self.evm_balance(user, token),
            self.core_balance(user, token),
            self.decimals(token),
        );
        WalletBalance::new(evm, core, decimals)
    }

    /// Balance valued at the spot price. `include_core` adds the Core balance.
    pub async fn token_balance(&self, user: Address, token: Address, include_core: bool) -> TokenBalance {
        let (balance, price) = tokio::join!(
            async {
                if include_core {
                    self.wallet_balance(user, token).await
                } else {
                    let (evm, decimals) =
                        tokio::join!(self.evm_balance(user, token), self.decimals(token));
                    WalletBalance::evm_only(evm, decimals)
                }
            },
            self.spot_price(token),
        );
        TokenBalance::new(token, balance, price)
    }

    /// Current gas price in gwei.
    pub async fn gas_price_gwei(&self) -> Result<Decimal> {
        let wei = self.chain.gas_price().await?;
        Ok(to_decimal(U256::from(wei), GWEI_DECIMALS))
    }

    pub async fn evm_to_wei(&self, token: Address, amount: U256) -> Result<U256> {
        let info = self.token_info(token).await?;
        Ok(units::evm_to_wei(amount, info.evm_extra_wei_decimals))
    }

    pub async fn wei_to_evm(&self, token: Address, wei: U256) -> Result<U256> {
        let info = self.token_info(token).await?;
        Ok(units::wei_to_evm(wei, info.evm_extra_wei_decimals))
    }

    pub async fn wei_to_sz(&self, token: Address, wei: U256) -> Result<U256> {
        let info = self.token_info(token).await?;
        Ok(units::wei_to_sz(wei, info.wei_decimals, info.sz_decimals))
    }

    pub async fn sz_to_wei(&self, token: Address, sz: U256) -> Result<U256> {
        let info = self.token_info(token).await?;
        Ok(units::sz_to_wei(sz, info.wei_decimals, info.sz_decimals))
    }
}

fn market_index(raw: u64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| {
        RebalanceError::PrecompileReadFailure {
            precompile: precompile::TOKEN_INFO,
            reason: format!("spot market index {raw} out of range"),
        }
        .into()
    })
}

fn precompile_failure(precompile: Address, error: &Error) -> Error {
    RebalanceError::PrecompileReadFailure {
        precompile,
        reason: error.to_string(),
    }
    .into()
}
