//! Write-side adapter: signed transactions through the broadcast RPC.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::network::EthereumWallet;
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};

use super::contracts::{ICoreWriter, IWrappedNative, IERC20};
use crate::error::{ChainError, ConfigError, Result};
use crate::port::{ChainWriter, CORE_WRITER};

/// [`ChainWriter`] signing with a local private key.
pub struct HyperEvmWriter {
    provider: DynProvider,
    address: Address,
}

impl HyperEvmWriter {
    /// Build a signing provider for `rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or the URL is invalid.
    pub fn connect(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self> {
        if private_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            }
            .into());
        }
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| ConfigError::InvalidValue {
                field: "WALLET_PRIVATE_KEY",
                reason: e.to_string(),
            })?;
        let address = signer.address();

        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| ConfigError::InvalidValue {
            field: "broadcast_rpc_url",
            reason: e.to_string(),
        })?;
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        info!(address = %address, chain_id, "Signer ready");
        Ok(Self { provider, address })
    }
}

/// Wait for the receipt; a failed status is a revert.
async fn confirm(pending: PendingTransactionBuilder<alloy_provider::network::Ethereum>) -> Result<B256> {
    let tx_hash = *pending.tx_hash();
    debug!(tx_hash = %tx_hash, "Transaction sent");
    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ChainError::Submit(format!("failed to get receipt for {tx_hash}: {e}")))?;
    if !receipt.status() {
        return Err(ChainError::Reverted {
            tx_hash: receipt.transaction_hash,
        }
        .into());
    }
    Ok(receipt.transaction_hash)
}

fn submit_failure(what: &str, e: impl std::fmt::Display) -> ChainError {
    ChainError::Submit(format!("failed to send {what}: {e}"))
}

#[async_trait]
impl ChainWriter for HyperEvmWriter {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_native(&self, to: Address, amount: U256) -> Result<B256> {
        let request = TransactionRequest::default().to(to).value(amount);
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| submit_failure("native transfer", e))?;
        confirm(pending).await
    }

    async fn transfer_erc20(&self, token: Address, to: Address, amount: U256) -> Result<B256> {
        let pending = IERC20::new(token, &self.provider)
            .transfer(to, amount)
            .send()
            .await
            .map_err(|e| submit_failure("token transfer", e))?;
        confirm(pending).await
    }

    async fn send_raw_action(&self, action: Bytes) -> Result<B256> {
        let pending = ICoreWriter::new(CORE_WRITER, &self.provider)
            .sendRawAction(action)
            .send()
            .await
            .map_err(|e| submit_failure("core action", e))?;
        confirm(pending).await
    }

    async fn wrap(&self, wrapped: Address, amount: U256) -> Result<B256> {
        let pending = IWrappedNative::new(wrapped, &self.provider)
            .deposit()
            .value(amount)
            .send()
            .await
            .map_err(|e| submit_failure("deposit", e))?;
        confirm(pending).await
    }

    async fn unwrap(&self, wrapped: Address, amount: U256) -> Result<B256> {
        let pending = IWrappedNative::new(wrapped, &self.provider)
            .withdraw(amount)
            .send()
            .await
            .map_err(|e| submit_failure("withdraw", e))?;
        confirm(pending).await
    }
}
