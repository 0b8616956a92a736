use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use hyperbalance::application::{
    BridgeSwapExecutor, PortfolioRebalancer, PrecisionReader, SettlementPolicy,
};
use hyperbalance::domain::token::WRAPPED_GAS_TOKEN;
use hyperbalance::testkit::domain::{seed_markets, HYPE_INDEX, USDT0, USDT0_INDEX, VAULT};
use hyperbalance::testkit::InMemoryChain;

use super::notifier::RecordingNotifier;

pub const HYPE_USD: u64 = 40;

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u8))
}

pub fn usdt0(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000u64)
}

/// Seeded mainnet chain with 1 native HYPE in the signer's account.
pub struct World {
    pub chain: Arc<InMemoryChain>,
    pub notifier: RecordingNotifier,
}

impl World {
    pub fn new() -> Self {
        Self::signed_by(VAULT)
    }

    pub fn signed_by(wallet: Address) -> Self {
        let chain = Arc::new(InMemoryChain::new(wallet));
        seed_markets(&chain, HYPE_USD);
        chain.set_native_balance(wallet, ether(1));
        Self {
            chain,
            notifier: RecordingNotifier::new(),
        }
    }

    pub fn reader(&self) -> PrecisionReader {
        PrecisionReader::new(self.chain.clone(), 999)
    }

    pub fn executor(&self) -> BridgeSwapExecutor {
        BridgeSwapExecutor::new(
            self.reader(),
            self.chain.clone(),
            SettlementPolicy {
                interval: Duration::ZERO,
                attempts: 3,
            },
        )
    }

    pub fn rebalancer(&self) -> PortfolioRebalancer {
        PortfolioRebalancer::new(self.executor(), Arc::new(self.notifier.clone()))
    }

    pub fn fund_whype(&self, amount: U256) {
        self.chain.set_erc20_balance(WRAPPED_GAS_TOKEN, VAULT, amount);
    }

    pub fn fund_usdt0(&self, amount: U256) {
        self.chain.set_erc20_balance(USDT0, VAULT, amount);
    }

    pub fn whype(&self) -> U256 {
        self.chain.erc20_balance_of(WRAPPED_GAS_TOKEN, VAULT)
    }

    pub fn usdt0(&self) -> U256 {
        self.chain.erc20_balance_of(USDT0, VAULT)
    }

    pub fn native(&self) -> U256 {
        self.chain.native_balance_of(VAULT)
    }

    pub fn core_hype(&self) -> u64 {
        self.chain.core_balance(VAULT, HYPE_INDEX)
    }

    pub fn core_usdt0(&self) -> u64 {
        self.chain.core_balance(VAULT, USDT0_INDEX)
    }
}
