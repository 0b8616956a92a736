//! Read-side adapter: read RPC, ERC-20 views, token registry and Core precompiles.

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use tracing::trace;

use super::contracts::{ITokenRegistry, SpotBalanceRecord, SpotInfoRecord, TokenInfoRecord, IERC20};
use crate::domain::{SpotBalance, SpotInfo, TokenInfo};
use crate::error::{ChainError, ConfigError, Result};
use crate::port::{precompile, ChainReader};

/// [`ChainReader`] over an HTTP JSON-RPC endpoint.
#[derive(Clone)]
pub struct HyperEvmReader {
    provider: DynProvider,
    token_registry: Address,
}

impl HyperEvmReader {
    /// Connect to `rpc_url`. No request is made until the first read.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn connect(rpc_url: &str, token_registry: Address) -> Result<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| ConfigError::InvalidValue {
            field: "read_rpc_url",
            reason: e.to_string(),
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self {
            provider,
            token_registry,
        })
    }

    /// Static call to a precompile with ABI-encoded arguments.
    async fn call_precompile(&self, precompile: Address, args: Vec<u8>) -> Result<Bytes> {
        let request = TransactionRequest::default()
            .to(precompile)
            .input(Bytes::from(args).into());
        let output = self
            .provider
            .call(request)
            .await
            .map_err(|e| ChainError::Read(format!("precompile {precompile}: {e}")))?;
        trace!(precompile = %precompile, bytes = output.len(), "Precompile read");
        Ok(output)
    }
}

fn decode_failure(what: &str, e: impl std::fmt::Display) -> ChainError {
    ChainError::Read(format!("failed to decode {what}: {e}"))
}

#[async_trait]
impl ChainReader for HyperEvmReader {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Read(e.to_string()).into())
    }

    async fn token_registry_index(&self, token: Address) -> Result<u32> {
        let registry = ITokenRegistry::new(self.token_registry, &self.provider);
        registry
            .getTokenIndex(token)
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("token registry lookup for {token}: {e}")).into())
    }

    async fn spot_balance(&self, user: Address, token_index: u64) -> Result<SpotBalance> {
        let output = self
            .call_precompile(precompile::SPOT_BALANCE, (user, token_index).abi_encode_params())
            .await?;
        let record = <SpotBalanceRecord as SolValue>::abi_decode(&output)
            .map_err(|e| decode_failure("spot balance", e))?;
        Ok(SpotBalance {
            total: record.total,
            hold: record.hold,
            entry_notional: record.entryNtl,
        })
    }

    async fn token_info(&self, token_index: u32) -> Result<TokenInfo> {
        let output = self
            .call_precompile(precompile::TOKEN_INFO, token_index.abi_encode())
            .await?;
        let record = <TokenInfoRecord as SolValue>::abi_decode(&output)
            .map_err(|e| decode_failure("token info", e))?;
        Ok(TokenInfo {
            name: record.name,
            spot_market_indices: record.spots,
            deployer_trading_fee_share: record.deployerTradingFeeShare,
            deployer: record.deployer,
            evm_contract: record.evmContract,
            sz_decimals: record.szDecimals,
            wei_decimals: record.weiDecimals,
            evm_extra_wei_decimals: record.evmExtraWeiDecimals,
        })
    }

    async fn spot_info(&self, spot_index: u32) -> Result<SpotInfo> {
        let output = self
            .call_precompile(precompile::SPOT_INFO, spot_index.abi_encode())
            .await?;
        let record = <SpotInfoRecord as SolValue>::abi_decode(&output)
            .map_err(|e| decode_failure("spot info", e))?;
        Ok(SpotInfo {
            name: record.name,
            tokens: record.tokens,
        })
    }

    async fn spot_px(&self, spot_index: u32) -> Result<u64> {
        let output = self
            .call_precompile(precompile::SPOT_PX, spot_index.abi_encode())
            .await?;
        Ok(<u64 as SolValue>::abi_decode(&output).map_err(|e| decode_failure("spot price", e))?)
    }

    async fn core_user_exists(&self, user: Address) -> Result<bool> {
        let output = self
            .call_precompile(precompile::CORE_USER_EXISTS, user.abi_encode())
            .await?;
        Ok(<bool as SolValue>::abi_decode(&output).map_err(|e| decode_failure("core user", e))?)
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("balanceOf on {token}: {e}")).into())
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("decimals on {token}: {e}")).into())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| ChainError::Read(e.to_string()).into())
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Read(e.to_string()).into())
    }
}
