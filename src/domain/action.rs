//! Actions submitted to Core through the write gateway.
//!
//! Every payload is `version || action_id || abi.encode(fields)`: one version byte,
//! a 3-byte big-endian action id, then the ABI-encoded parameters.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;

/// Envelope version understood by the write gateway.
pub const ACTION_VERSION: u8 = 1;

/// Offset added to a spot market index to form its order-book asset id.
pub const SPOT_ASSET_OFFSET: u32 = 10_000;

/// Time-in-force of a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeInForce {
    Alo = 1,
    Gtc = 2,
    Ioc = 3,
}

/// Order-book asset id of a spot market.
#[must_use]
pub fn spot_asset_id(spot_index: u32) -> u32 {
    spot_index + SPOT_ASSET_OFFSET
}

/// A Core action, ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreAction {
    /// Limit order; price and size are 8-decimal fixed point.
    LimitOrder {
        asset: u32,
        is_buy: bool,
        limit_px: u64,
        sz: u64,
        reduce_only: bool,
        tif: TimeInForce,
        cloid: u128,
    },
    /// Transfer `wei` of a Core token to `destination`.
    SpotSend {
        destination: Address,
        token: u64,
        wei: u64,
    },
    AddApiWallet {
        wallet: Address,
        name: String,
    },
    CancelOrderByOid {
        asset: u32,
        oid: u64,
    },
}

impl CoreAction {
    /// Immediate-or-cancel order with no client order id.
    #[must_use]
    pub fn ioc(asset: u32, is_buy: bool, limit_px: u64, sz: u64) -> Self {
        Self::LimitOrder {
            asset,
            is_buy,
            limit_px,
            sz,
            reduce_only: false,
            tif: TimeInForce::Ioc,
            cloid: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::LimitOrder { .. } => 1,
            Self::SpotSend { .. } => 6,
            Self::AddApiWallet { .. } => 9,
            Self::CancelOrderByOid { .. } => 10,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LimitOrder { .. } => "limit_order",
            Self::SpotSend { .. } => "spot_send",
            Self::AddApiWallet { .. } => "add_api_wallet",
            Self::CancelOrderByOid { .. } => "cancel_order_by_oid",
        }
    }

    /// Encode into the write gateway's raw action payload.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let params = match self {
            Self::LimitOrder {
                asset,
                is_buy,
                limit_px,
                sz,
                reduce_only,
                tif,
                cloid,
            } => (*asset, *is_buy, *limit_px, *sz, *reduce_only, u32::from(*tif as u8), *cloid).abi_encode_params(),
            Self::SpotSend {
                destination,
                token,
                wei,
            } => (*destination, *token, *wei).abi_encode_params(),
            Self::AddApiWallet { wallet, name } => (*wallet, name.clone()).abi_encode_params(),
            Self::CancelOrderByOid { asset, oid } => (*asset, *oid).abi_encode_params(),
        };

        let id = self.id().to_be_bytes();
        let mut payload = Vec::with_capacity(4 + params.len());
        payload.push(ACTION_VERSION);
        payload.extend_from_slice(&id[1..]);
        payload.extend_from_slice(&params);
        payload.into()
    }
}
