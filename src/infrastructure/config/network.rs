//! Chain and RPC endpoints.

use alloy_primitives::Address;
use serde::Deserialize;

use crate::port::DEFAULT_TOKEN_REGISTRY;

/// HyperEVM network settings.
///
/// Reads and broadcasts may use different endpoints; both default to the same URL
/// in most deployments.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub read_rpc_url: String,
    pub broadcast_rpc_url: String,
    #[serde(default = "default_token_registry")]
    pub token_registry: Address,
}

impl NetworkConfig {
    #[must_use]
    pub fn is_mainnet(&self) -> bool {
        self.chain_id == 999
    }
}

fn default_chain_id() -> u64 {
    999
}

fn default_token_registry() -> Address {
    DEFAULT_TOKEN_REGISTRY
}
