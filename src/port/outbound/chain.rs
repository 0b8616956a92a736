//! Chain ports: reads through the read RPC and signed writes through the broadcast RPC.
//!
//! Core state is only visible on HyperEVM through fixed-address read precompiles and is
//! only mutable through the write gateway contract. Implementations wait for each
//! transaction's receipt before returning and report reverts as
//! [`ChainError::Reverted`](crate::error::ChainError::Reverted).

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::domain::{SpotBalance, SpotInfo, TokenInfo};
use crate::error::Result;

/// Read precompile addresses.
pub mod precompile {
    use alloy_primitives::{address, Address};

    /// `spotBalance(address user, uint64 token)`.
    pub const SPOT_BALANCE: Address = address!("0x0000000000000000000000000000000000000801");
    /// `spotPx(uint32 index)`.
    pub const SPOT_PX: Address = address!("0x0000000000000000000000000000000000000808");
    /// `spotInfo(uint32 index)`.
    pub const SPOT_INFO: Address = address!("0x000000000000000000000000000000000000080b");
    /// `tokenInfo(uint32 index)`.
    pub const TOKEN_INFO: Address = address!("0x000000000000000000000000000000000000080c");
    /// `coreUserExists(address user)`.
    pub const CORE_USER_EXISTS: Address = address!("0x0000000000000000000000000000000000000810");
}

/// Contract accepting `sendRawAction(bytes)`.
pub const CORE_WRITER: Address = alloy_primitives::address!("0x3333333333333333333333333333333333333333");

/// Token registry deployed on mainnet.
pub const DEFAULT_TOKEN_REGISTRY: Address =
    alloy_primitives::address!("0x0b51d1a9098cf8a72c325003f44c194d41d7a85b");

/// Read access to HyperEVM and, through precompiles, to Core.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// Core token index registered for an ERC-20 contract.
    async fn token_registry_index(&self, token: Address) -> Result<u32>;

    async fn spot_balance(&self, user: Address, token_index: u64) -> Result<SpotBalance>;

    async fn token_info(&self, token_index: u32) -> Result<TokenInfo>;

    async fn spot_info(&self, spot_index: u32) -> Result<SpotInfo>;

    /// Raw spot price; divide by `10^(8 - sz_decimals)` for the human price.
    async fn spot_px(&self, spot_index: u32) -> Result<u64>;

    async fn core_user_exists(&self, user: Address) -> Result<bool>;

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn erc20_decimals(&self, token: Address) -> Result<u8>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128>;
}

/// Signed writes from the configured wallet.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Address of the signing wallet.
    fn address(&self) -> Address;

    async fn send_native(&self, to: Address, amount: U256) -> Result<B256>;

    async fn transfer_erc20(&self, token: Address, to: Address, amount: U256) -> Result<B256>;

    /// Submit an encoded action to the write gateway.
    async fn send_raw_action(&self, action: Bytes) -> Result<B256>;

    /// `deposit()` `amount` of native gas asset into `wrapped`.
    async fn wrap(&self, wrapped: Address, amount: U256) -> Result<B256>;

    /// `withdraw(amount)` from `wrapped`.
    async fn unwrap(&self, wrapped: Address, amount: U256) -> Result<B256>;
}
