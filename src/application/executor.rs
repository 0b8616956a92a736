//! Bridge transfers, IOC swaps through USDC and settlement polling.
//!
//! Every call sends at most one transaction and reports failures without retrying.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, info, warn};

use super::reader::PrecisionReader;
use crate::domain::action::{spot_asset_id, CoreAction};
use crate::domain::token::{
    is_gas_asset, system_address, GAS_ASSET_SYSTEM_ADDRESS, USDC_TOKEN_INDEX, WRAPPED_GAS_TOKEN,
};
use crate::domain::units::{
    apply_slippage, evm_to_wei, format_price, from_decimal, pow10, sz_to_wei, truncate, usd,
    OrderSize, PriceClass, GAS_ASSET_EXTRA_WEI_DECIMALS, ORDER_DECIMALS,
};
use crate::domain::{SwapResult, SwapStatus, TransactionResult};
use crate::error::{BridgeDirection, Error, RebalanceError, Result, SwapStage};
use crate::port::ChainWriter;

/// How long to wait for Core to reflect a transfer or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            attempts: 30,
        }
    }
}

/// A token amount to move, in HyperEVM units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeRequest {
    pub token: Address,
    pub amount: U256,
}

impl BridgeRequest {
    #[must_use]
    pub fn new(token: Address, amount: U256) -> Self {
        Self { token, amount }
    }
}

/// Sends the transactions of a rebalancing sequence.
pub struct BridgeSwapExecutor {
    reader: PrecisionReader,
    writer: Arc<dyn ChainWriter>,
    settlement: SettlementPolicy,
}

impl BridgeSwapExecutor {
    #[must_use]
    pub fn new(reader: PrecisionReader, writer: Arc<dyn ChainWriter>, settlement: SettlementPolicy) -> Self {
        Self {
            reader,
            writer,
            settlement,
        }
    }

    /// Signing wallet.
    #[must_use]
    pub fn address(&self) -> Address {
        self.writer.address()
    }

    /// Move `request.amount` from HyperEVM to Core.
    ///
    /// The gas asset is sent natively to its system address after flooring to Core
    /// precision; the returned amount is what was actually sent. Other tokens are
    /// transferred to their system address unchanged.
    pub async fn bridge_to_core(&self, request: &BridgeRequest) -> Result<TransactionResult> {
        let direction = BridgeDirection::ToCore;
        if request.amount.is_zero() {
            return Err(RebalanceError::MissingExecutionParameters("bridge amount").into());
        }

        let (tx_hash, amount) = if is_gas_asset(request.token) {
            let precision = pow10(GAS_ASSET_EXTRA_WEI_DECIMALS);
            let floored = request.amount / precision * precision;
            if floored.is_zero() {
                return Err(bridge_failed(direction, "amount below Core precision"));
            }
            let hash = self
                .writer
                .send_native(GAS_ASSET_SYSTEM_ADDRESS, floored)
                .await
                .map_err(|e| bridge_failed(direction, e))?;
            (hash, floored)
        } else {
            let index = self.reader.token_index(request.token).await?;
            let hash = self
                .writer
                .transfer_erc20(request.token, system_address(index), request.amount)
                .await
                .map_err(|e| bridge_failed(direction, e))?;
            (hash, request.amount)
        };

        info!(token = %request.token, amount = %amount, tx_hash = %tx_hash, "Bridged to Core");
        Ok(TransactionResult { tx_hash, amount })
    }

    /// Move `request.amount` (HyperEVM units) from Core back to HyperEVM.
    pub async fn bridge_to_evm(&self, request: &BridgeRequest) -> Result<TransactionResult> {
        let direction = BridgeDirection::ToEvm;
        if request.amount.is_zero() {
            return Err(RebalanceError::MissingExecutionParameters("bridge amount").into());
        }

        let index = self.reader.token_index(request.token).await?;
        let wei = self.reader.evm_to_wei(request.token, request.amount).await?;
        if wei.is_zero() {
            return Err(bridge_failed(direction, "amount below Core precision"));
        }
        let destination = if is_gas_asset(request.token) {
            GAS_ASSET_SYSTEM_ADDRESS
        } else {
            system_address(index)
        };

        let tx_hash = self
            .spot_send(destination, u64::from(index), wei)
            .await
            .map_err(|e| match e {
                Error::Rebalance(RebalanceError::SelfTransfer(_)) => e,
                other => bridge_failed(direction, other),
            })?;

        info!(token = %request.token, amount = %request.amount, wei = %wei, tx_hash = %tx_hash, "Bridged to EVM");
        Ok(TransactionResult {
            tx_hash,
            amount: request.amount,
        })
    }

    /// Transfer Core wei of `token_index` to `destination`.
    pub async fn spot_send(&self, destination: Address, token_index: u64, wei: U256) -> Result<B256> {
        if destination == self.writer.address() {
            return Err(RebalanceError::SelfTransfer(destination).into());
        }
        let wei = u64::try_from(wei).map_err(|_| RebalanceError::InsufficientBalance {
            required: wei,
            available: U256::from(u64::MAX),
        })?;
        let action = CoreAction::SpotSend {
            destination,
            token: token_index,
            wei,
        };
        debug!(action = action.name(), destination = %destination, token_index, wei, "Sending action");
        self.writer.send_raw_action(action.encode()).await
    }

    /// Sell `amount` (HyperEVM units) of `token` for USDC with an IOC order.
    ///
    /// The expected amount is USDC Core wei at the current spot price.
    pub async fn swap_asset_to_usdc(&self, token: Address, amount: U256) -> Result<SwapResult> {
        let stage = SwapStage::AssetToUsdc;
        let info = self.reader.token_info(token).await?;
        let market = self.reader.spot_index(token).await?;
        let price = self.reader.try_spot_price(token).await?;
        if price.is_zero() {
            return Err(swap_failed(stage, "no spot price"));
        }

        let wei = evm_to_wei(amount, info.evm_extra_wei_decimals);
        let size = OrderSize::from_wei(wei, info.wei_decimals, info.sz_decimals)
            .filter(|size| !size.is_zero())
            .ok_or_else(|| swap_failed(stage, "order size rounds to zero"))?;
        let limit = format_price(
            apply_slippage(usd(price), false),
            PriceClass::for_token(&info.name),
            info.sz_decimals,
        );
        let limit_px = encode_price(limit).ok_or_else(|| swap_failed(stage, "limit price out of range"))?;

        let order = CoreAction::ioc(spot_asset_id(market), false, limit_px, size.encoded);
        let tx_hash = self
            .writer
            .send_raw_action(order.encode())
            .await
            .map_err(|e| swap_failed(stage, e))?;

        let expected_amount = U256::from(size.encoded).saturating_mul(price) / pow10(ORDER_DECIMALS);
        info!(
            token = %info.name,
            size = %size.size,
            limit = %limit,
            expected_usdc = %expected_amount,
            tx_hash = %tx_hash,
            "Sell order sent"
        );
        Ok(SwapResult {
            tx_hash,
            expected_amount,
            order,
        })
    }

    /// Buy `token` with `usdc_wei` (8-decimal USD) using an IOC order.
    ///
    /// The expected amount is Core wei of `token`.
    pub async fn swap_usdc_to_asset(&self, token: Address, usdc_wei: U256) -> Result<SwapResult> {
        let stage = SwapStage::UsdcToAsset;
        let info = self.reader.token_info(token).await?;
        let market = self.reader.spot_index(token).await?;
        let price = self.reader.try_spot_price(token).await?;
        if price.is_zero() {
            return Err(swap_failed(stage, "no spot price"));
        }

        let limit = format_price(
            apply_slippage(usd(price), true),
            PriceClass::for_token(&info.name),
            info.sz_decimals,
        );
        if limit.is_zero() {
            return Err(swap_failed(stage, "limit price rounds to zero"));
        }
        let budget = usd(usdc_wei);
        let size = OrderSize::from_size(truncate(budget / limit, info.sz_decimals.into()), info.sz_decimals)
            .filter(|size| !size.is_zero())
            .ok_or_else(|| swap_failed(stage, "order size rounds to zero"))?;
        let limit_px = encode_price(limit).ok_or_else(|| swap_failed(stage, "limit price out of range"))?;

        let order = CoreAction::ioc(spot_asset_id(market), true, limit_px, size.encoded);
        let tx_hash = self
            .writer
            .send_raw_action(order.encode())
            .await
            .map_err(|e| swap_failed(stage, e))?;

        let expected_amount = sz_to_wei(size.sz_units, info.wei_decimals, info.sz_decimals);
        info!(
            token = %info.name,
            size = %size.size,
            limit = %limit,
            budget = %budget,
            tx_hash = %tx_hash,
            "Buy order sent"
        );
        Ok(SwapResult {
            tx_hash,
            expected_amount,
            order,
        })
    }

    /// Cancel a resting order by its id.
    pub async fn cancel_order(&self, asset: u32, oid: u64) -> Result<B256> {
        let action = CoreAction::CancelOrderByOid { asset, oid };
        self.writer.send_raw_action(action.encode()).await
    }

    /// Authorise `wallet` to trade on behalf of the signer.
    pub async fn add_api_wallet(&self, wallet: Address, name: &str) -> Result<B256> {
        let action = CoreAction::AddApiWallet {
            wallet,
            name: name.to_string(),
        };
        self.writer.send_raw_action(action.encode()).await
    }

    /// Core balance increase of `token` over `baseline` against `expected` (Core wei).
    /// Complete once at least 99% has arrived.
    pub async fn check_swap_completed(&self, token: Address, baseline: U256, expected: U256) -> Result<SwapStatus> {
        let current = self.core_wei(token).await?;
        Ok(settlement_status(current, baseline, expected))
    }

    /// Poll [`check_swap_completed`](Self::check_swap_completed) until complete.
    pub async fn wait_for_settlement(&self, token: Address, baseline: U256, expected: U256) -> Result<SwapStatus> {
        self.poll(baseline, expected, || self.core_wei(token)).await
    }

    /// Poll the HyperEVM balance of `token` until it grew by `expected` over `baseline`.
    pub async fn wait_for_evm_credit(&self, token: Address, baseline: U256, expected: U256) -> Result<SwapStatus> {
        let user = self.writer.address();
        self.poll(baseline, expected, || async move {
            Ok(self.reader.evm_balance(user, token).await)
        })
        .await
    }

    /// Poll the signer's Core USDC balance until it grew by `expected` over `baseline`.
    pub async fn wait_for_usdc(&self, baseline: U256, expected: U256) -> Result<SwapStatus> {
        self.poll(baseline, expected, || self.usdc_wei()).await
    }

    /// Current Core balance of the signer, in Core wei.
    pub async fn core_wei(&self, token: Address) -> Result<U256> {
        let balance = self.reader.spot_balance(self.writer.address(), token).await?;
        Ok(U256::from(balance.total))
    }

    /// Current Core USDC balance of the signer, in Core wei.
    pub async fn usdc_wei(&self) -> Result<U256> {
        let balance = self
            .reader
            .spot_balance_at(self.writer.address(), USDC_TOKEN_INDEX)
            .await?;
        Ok(U256::from(balance.total))
    }

    async fn poll<F, Fut>(&self, baseline: U256, expected: U256, mut probe: F) -> Result<SwapStatus>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<U256>>,
    {
        let mut last = settlement_status(baseline, baseline, expected);
        for attempt in 0..self.settlement.attempts {
            if attempt > 0 {
                tokio::time::sleep(self.settlement.interval).await;
            }
            last = settlement_status(probe().await?, baseline, expected);
            if last.completed {
                debug!(attempt, received = %last.received, "Settled");
                return Ok(last);
            }
            debug!(attempt, pending = %last.pending_amount, "Waiting for settlement");
        }
        warn!(expected = %expected, received = %last.received, "Settlement timed out");
        Err(RebalanceError::SwapNotCompleted {
            expected,
            actual: last.received,
        }
        .into())
    }

    /// `deposit()` native gas asset into its wrapped form.
    pub async fn wrap(&self, amount: U256) -> Result<TransactionResult> {
        let tx_hash = self
            .writer
            .wrap(WRAPPED_GAS_TOKEN, amount)
            .await
            .map_err(|e| RebalanceError::WrapUnwrapFailed(e.to_string()))?;
        info!(amount = %amount, tx_hash = %tx_hash, "Wrapped");
        Ok(TransactionResult { tx_hash, amount })
    }

    /// `withdraw(amount)` the wrapped gas asset to native.
    pub async fn unwrap(&self, amount: U256) -> Result<TransactionResult> {
        let tx_hash = self
            .writer
            .unwrap(WRAPPED_GAS_TOKEN, amount)
            .await
            .map_err(|e| RebalanceError::WrapUnwrapFailed(e.to_string()))?;
        info!(amount = %amount, tx_hash = %tx_hash, "Unwrapped");
        Ok(TransactionResult { tx_hash, amount })
    }

    /// Whether `token` is USDC on Core, where swaps through USDC are skipped.
    pub async fn is_usdc(&self, token: Address) -> Result<bool> {
        Ok(self.reader.token_index(token).await? == USDC_TOKEN_INDEX)
    }

    #[must_use]
    pub fn reader(&self) -> &PrecisionReader {
        &self.reader
    }
}

/// Settlement is complete once `received * 100 >= expected * 99`.
#[must_use]
pub fn settlement_status(current: U256, baseline: U256, expected: U256) -> SwapStatus {
    let received = current.saturating_sub(baseline);
    let completed = received.saturating_mul(U256::from(100u8)) >= expected.saturating_mul(U256::from(99u8));
    SwapStatus {
        completed,
        current_balance: current,
        received,
        pending_amount: expected.saturating_sub(received),
    }
}

fn encode_price(price: rust_decimal::Decimal) -> Option<u64> {
    from_decimal(price, ORDER_DECIMALS).and_then(|p| u64::try_from(p).ok())
}

fn bridge_failed(direction: BridgeDirection, reason: impl ToString) -> Error {
    RebalanceError::BridgeFailed {
        direction,
        reason: reason.to_string(),
    }
    .into()
}

fn swap_failed(stage: SwapStage, reason: impl ToString) -> Error {
    RebalanceError::SwapFailed {
        stage,
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_within_one_percent_is_complete() {
        let status = settlement_status(U256::from(1_990u64), U256::from(1_000u64), U256::from(1_000u64));
        assert!(status.completed);
        assert_eq!(status.received, U256::from(990u64));
        assert_eq!(status.pending_amount, U256::from(10u64));

        let status = settlement_status(U256::from(1_989u64), U256::from(1_000u64), U256::from(1_000u64));
        assert!(!status.completed);
    }

    #[test]
    fn balance_drop_counts_as_nothing_received() {
        let status = settlement_status(U256::from(5u64), U256::from(10u64), U256::from(3u64));
        assert_eq!(status.received, U256::ZERO);
        assert_eq!(status.pending_amount, U256::from(3u64));
        assert!(!status.completed);
    }
}
