//! In-memory chain implementing both chain ports.
//!
//! Holds scripted HyperEVM and Core balances, token metadata and spot prices, and
//! applies each write the way the network would: transfers to system addresses credit
//! Core, spot sends to system addresses credit HyperEVM, and IOC orders fill at the
//! current spot price when the limit allows. Core-side rejections are silent, as on
//! the real network, so only settlement polling notices them.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::action::SPOT_ASSET_OFFSET;
use crate::domain::token::{gas_asset_index, system_address, GAS_ASSET_SYSTEM_ADDRESS};
use crate::domain::units::{evm_to_wei, pow10, wei_to_evm, GAS_ASSET_EXTRA_WEI_DECIMALS, ORDER_DECIMALS};
use crate::domain::{SpotBalance, SpotInfo, TokenInfo};
use crate::error::{ChainError, Result};
use crate::port::{ChainReader, ChainWriter};

/// A transaction the chain accepted, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentTransaction {
    Native { to: Address, amount: U256 },
    Erc20Transfer { token: Address, to: Address, amount: U256 },
    Action { id: u32, payload: Bytes },
    Wrap { amount: U256 },
    Unwrap { amount: U256 },
}

impl SentTransaction {
    /// Write gateway action id, if this is an action.
    #[must_use]
    pub fn action_id(&self) -> Option<u32> {
        match self {
            Self::Action { id, .. } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ChainState {
    chain_id: u64,
    gas_price_wei: u128,
    registry: HashMap<Address, u32>,
    tokens: HashMap<u32, TokenInfo>,
    spots: HashMap<u32, SpotInfo>,
    prices: HashMap<u32, u64>,
    core: HashMap<(Address, u64), u64>,
    erc20: HashMap<(Address, Address), U256>,
    decimals: HashMap<Address, u8>,
    native: HashMap<Address, U256>,
    core_users: HashSet<Address>,
    sent: Vec<SentTransaction>,
    fail_write_at: Option<usize>,
    fill_orders: bool,
    failing_reads: bool,
    evm_credit_fee_bps: u32,
    registry_outage_after: Option<usize>,
}

/// Scriptable chain shared by a reader and a writer.
pub struct InMemoryChain {
    wallet: Address,
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    /// Mainnet chain id, 1 gwei gas, orders fill.
    #[must_use]
    pub fn new(wallet: Address) -> Self {
        Self {
            wallet,
            state: Mutex::new(ChainState {
                chain_id: 999,
                gas_price_wei: 1_000_000_000,
                fill_orders: true,
                ..ChainState::default()
            }),
        }
    }

    #[must_use]
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_gas_price_gwei(&self, gwei: u64) {
        self.state.lock().gas_price_wei = u128::from(gwei) * 1_000_000_000;
    }

    /// Register a Core token; `evm_address` is added to the token registry unless it is
    /// the zero address.
    pub fn list_token(&self, index: u32, evm_address: Address, info: TokenInfo) {
        let mut state = self.state.lock();
        if !evm_address.is_zero() {
            state.registry.insert(evm_address, index);
        }
        state.tokens.insert(index, info);
    }

    /// Register a spot market `[base, quote]` with a raw price.
    pub fn list_spot(&self, spot_index: u32, name: &str, tokens: [u64; 2], px: u64) {
        let mut state = self.state.lock();
        state.spots.insert(
            spot_index,
            SpotInfo {
                name: name.to_string(),
                tokens,
            },
        );
        state.prices.insert(spot_index, px);
    }

    pub fn set_spot_px(&self, spot_index: u32, px: u64) {
        self.state.lock().prices.insert(spot_index, px);
    }

    pub fn set_core_balance(&self, user: Address, token_index: u32, wei: u64) {
        self.state.lock().core.insert((user, u64::from(token_index)), wei);
    }

    #[must_use]
    pub fn core_balance(&self, user: Address, token_index: u32) -> u64 {
        self.state
            .lock()
            .core
            .get(&(user, u64::from(token_index)))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_erc20_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state.lock().erc20.insert((token, owner), amount);
    }

    #[must_use]
    pub fn erc20_balance_of(&self, token: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .erc20
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.state.lock().decimals.insert(token, decimals);
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state.lock().native.insert(owner, amount);
    }

    #[must_use]
    pub fn native_balance_of(&self, owner: Address) -> U256 {
        self.state.lock().native.get(&owner).copied().unwrap_or_default()
    }

    pub fn add_core_user(&self, user: Address) {
        self.state.lock().core_users.insert(user);
    }

    /// The write with this zero-based position fails to submit.
    pub fn fail_write_at(&self, position: usize) {
        self.state.lock().fail_write_at = Some(position);
    }

    /// When false, IOC orders are accepted but never fill.
    pub fn set_fill_orders(&self, fill: bool) {
        self.state.lock().fill_orders = fill;
    }

    /// Withhold this share, in basis points, of every Core to HyperEVM credit.
    pub fn set_evm_credit_fee_bps(&self, bps: u32) {
        self.state.lock().evm_credit_fee_bps = bps;
    }

    /// Token registry lookups fail once this many writes have been sent.
    pub fn set_registry_outage_after(&self, writes: usize) {
        self.state.lock().registry_outage_after = Some(writes);
    }

    /// When true, balance and price reads fail.
    pub fn set_failing_reads(&self, failing: bool) {
        self.state.lock().failing_reads = failing;
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SentTransaction> {
        self.state.lock().sent.clone()
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    /// Record a write, or fail it if scripted to.
    fn submit(&self, state: &mut ChainState, tx: SentTransaction) -> Result<B256> {
        let position = state.sent.len();
        if state.fail_write_at == Some(position) {
            return Err(ChainError::Submit(format!("scripted failure of write {position}")).into());
        }
        state.sent.push(tx);
        Ok(tx_hash(position + 1))
    }
}

fn tx_hash(n: usize) -> B256 {
    B256::left_padding_from(&(n as u64).to_be_bytes())
}

fn revert(n: usize) -> ChainError {
    ChainError::Reverted { tx_hash: tx_hash(n) }
}

fn read_failure(what: &str) -> crate::error::Error {
    ChainError::Read(format!("scripted {what} failure")).into()
}

fn word(payload: &[u8], index: usize) -> Option<U256> {
    payload
        .get(4 + index * 32..4 + (index + 1) * 32)
        .map(U256::from_be_slice)
}

fn word_u64(payload: &[u8], index: usize) -> Option<u64> {
    word(payload, index).and_then(|w| u64::try_from(w).ok())
}

impl ChainState {
    fn debit_core(&mut self, user: Address, token: u64, wei: u64) -> bool {
        let entry = self.core.entry((user, token)).or_default();
        if *entry < wei {
            return false;
        }
        *entry -= wei;
        true
    }

    fn credit_core(&mut self, user: Address, token: u64, wei: u64) {
        *self.core.entry((user, token)).or_default() += wei;
    }

    fn gas_index(&self) -> Option<u64> {
        gas_asset_index(self.chain_id).map(u64::from)
    }

    fn apply_action(&mut self, wallet: Address, id: u32, payload: &[u8]) {
        match id {
            1 => self.apply_order(wallet, payload),
            6 => self.apply_spot_send(wallet, payload),
            _ => {}
        }
    }

    fn apply_spot_send(&mut self, wallet: Address, payload: &[u8]) {
        let (Some(destination), Some(token), Some(wei)) =
            (word(payload, 0), word_u64(payload, 1), word_u64(payload, 2))
        else {
            return;
        };
        let destination = Address::from_word(destination.to_be_bytes::<32>().into());
        if !self.debit_core(wallet, token, wei) {
            return;
        }

        let Ok(index) = u32::try_from(token) else {
            return;
        };
        let is_gas = self.gas_index() == Some(token);
        let bridged = (is_gas && destination == GAS_ASSET_SYSTEM_ADDRESS)
            || (!is_gas && destination == system_address(index));
        if !bridged {
            self.credit_core(destination, token, wei);
            return;
        }

        let Some(info) = self.tokens.get(&index) else {
            return;
        };
        let full = wei_to_evm(U256::from(wei), info.evm_extra_wei_decimals);
        let fee = full * U256::from(self.evm_credit_fee_bps) / U256::from(10_000u32);
        let amount = full - fee;
        if is_gas {
            *self.native.entry(wallet).or_default() += amount;
        } else {
            let contract = info.evm_contract;
            *self.erc20.entry((contract, wallet)).or_default() += amount;
        }
    }

    fn apply_order(&mut self, wallet: Address, payload: &[u8]) {
        if !self.fill_orders {
            return;
        }
        let (Some(asset), Some(is_buy), Some(limit_px), Some(sz)) = (
            word_u64(payload, 0),
            word(payload, 1).map(|w| !w.is_zero()),
            word_u64(payload, 2),
            word_u64(payload, 3),
        ) else {
            return;
        };
        let Some(spot) = asset
            .checked_sub(u64::from(SPOT_ASSET_OFFSET))
            .and_then(|s| u32::try_from(s).ok())
        else {
            return;
        };
        let (Some(market), Some(&px)) = (self.spots.get(&spot).cloned(), self.prices.get(&spot)) else {
            return;
        };
        let [base, quote] = market.tokens;
        let Some(info) = u32::try_from(base).ok().and_then(|b| self.tokens.get(&b)) else {
            return;
        };

        let price = U256::from(px) * pow10(info.sz_decimals.into());
        let limit = U256::from(limit_px);
        let crosses = if is_buy { price <= limit } else { price >= limit };
        if !crosses {
            return;
        }

        let base_wei = U256::from(sz) * pow10(info.wei_decimals.into()) / pow10(ORDER_DECIMALS);
        let quote_wei = U256::from(sz) * price / pow10(ORDER_DECIMALS);
        let (Ok(base_wei), Ok(quote_wei)) = (u64::try_from(base_wei), u64::try_from(quote_wei)) else {
            return;
        };

        if is_buy {
            if self.debit_core(wallet, quote, quote_wei) {
                self.credit_core(wallet, base, base_wei);
            }
        } else if self.debit_core(wallet, base, base_wei) {
            self.credit_core(wallet, quote, quote_wei);
        }
    }
}

#[async_trait]
impl ChainReader for InMemoryChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.state.lock().chain_id)
    }

    async fn token_registry_index(&self, token: Address) -> Result<u32> {
        let state = self.state.lock();
        if state
            .registry_outage_after
            .is_some_and(|writes| state.sent.len() >= writes)
        {
            return Err(read_failure("token registry"));
        }
        state
            .registry
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::Read(format!("{token} not registered")).into())
    }

    async fn spot_balance(&self, user: Address, token_index: u64) -> Result<SpotBalance> {
        let state = self.state.lock();
        if state.failing_reads {
            return Err(read_failure("spot balance"));
        }
        Ok(SpotBalance {
            total: state.core.get(&(user, token_index)).copied().unwrap_or_default(),
            ..SpotBalance::default()
        })
    }

    async fn token_info(&self, token_index: u32) -> Result<TokenInfo> {
        self.state
            .lock()
            .tokens
            .get(&token_index)
            .cloned()
            .ok_or_else(|| ChainError::Read(format!("unknown token {token_index}")).into())
    }

    async fn spot_info(&self, spot_index: u32) -> Result<SpotInfo> {
        self.state
            .lock()
            .spots
            .get(&spot_index)
            .cloned()
            .ok_or_else(|| ChainError::Read(format!("unknown spot {spot_index}")).into())
    }

    async fn spot_px(&self, spot_index: u32) -> Result<u64> {
        let state = self.state.lock();
        if state.failing_reads {
            return Err(read_failure("spot price"));
        }
        state
            .prices
            .get(&spot_index)
            .copied()
            .ok_or_else(|| ChainError::Read(format!("no price for spot {spot_index}")).into())
    }

    async fn core_user_exists(&self, user: Address) -> Result<bool> {
        let state = self.state.lock();
        Ok(state.core_users.contains(&user) || state.core.keys().any(|(owner, _)| *owner == user))
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let state = self.state.lock();
        if state.failing_reads {
            return Err(read_failure("balance"));
        }
        Ok(state.erc20.get(&(token, owner)).copied().unwrap_or_default())
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8> {
        self.state
            .lock()
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| read_failure("decimals"))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        let state = self.state.lock();
        if state.failing_reads {
            return Err(read_failure("balance"));
        }
        Ok(state.native.get(&owner).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.state.lock().gas_price_wei)
    }
}

#[async_trait]
impl ChainWriter for InMemoryChain {
    fn address(&self) -> Address {
        self.wallet
    }

    async fn send_native(&self, to: Address, amount: U256) -> Result<B256> {
        let mut state = self.state.lock();
        let hash = self.submit(&mut state, SentTransaction::Native { to, amount })?;
        let balance = state.native.entry(self.wallet).or_default();
        if *balance < amount {
            return Err(revert(state.sent.len()).into());
        }
        *balance -= amount;

        if to == GAS_ASSET_SYSTEM_ADDRESS {
            if let Some(index) = state.gas_index() {
                let wei = amount / pow10(GAS_ASSET_EXTRA_WEI_DECIMALS);
                let wei = u64::try_from(wei).unwrap_or(u64::MAX);
                state.credit_core(self.wallet, index, wei);
            }
        } else {
            *state.native.entry(to).or_default() += amount;
        }
        Ok(hash)
    }

    async fn transfer_erc20(&self, token: Address, to: Address, amount: U256) -> Result<B256> {
        let mut state = self.state.lock();
        let hash = self.submit(&mut state, SentTransaction::Erc20Transfer { token, to, amount })?;
        let balance = state.erc20.entry((token, self.wallet)).or_default();
        if *balance < amount {
            return Err(revert(state.sent.len()).into());
        }
        *balance -= amount;

        let bridged = state
            .registry
            .get(&token)
            .copied()
            .filter(|index| system_address(*index) == to);
        match bridged {
            Some(index) => {
                let extra = state
                    .tokens
                    .get(&index)
                    .map(|info| info.evm_extra_wei_decimals)
                    .unwrap_or_default();
                let wei = u64::try_from(evm_to_wei(amount, extra)).unwrap_or(u64::MAX);
                state.credit_core(self.wallet, u64::from(index), wei);
            }
            None => *state.erc20.entry((token, to)).or_default() += amount,
        }
        Ok(hash)
    }

    async fn send_raw_action(&self, action: Bytes) -> Result<B256> {
        let mut state = self.state.lock();
        let id = match action.get(..4) {
            Some(&[_, a, b, c]) => u32::from_be_bytes([0, a, b, c]),
            _ => return Err(ChainError::Submit("malformed action".into()).into()),
        };
        let hash = self.submit(
            &mut state,
            SentTransaction::Action {
                id,
                payload: action.clone(),
            },
        )?;
        state.apply_action(self.wallet, id, &action);
        Ok(hash)
    }

    async fn wrap(&self, wrapped: Address, amount: U256) -> Result<B256> {
        let mut state = self.state.lock();
        let hash = self.submit(&mut state, SentTransaction::Wrap { amount })?;
        let native = state.native.entry(self.wallet).or_default();
        if *native < amount {
            return Err(revert(state.sent.len()).into());
        }
        *native -= amount;
        *state.erc20.entry((wrapped, self.wallet)).or_default() += amount;
        Ok(hash)
    }

    async fn unwrap(&self, wrapped: Address, amount: U256) -> Result<B256> {
        let mut state = self.state.lock();
        let hash = self.submit(&mut state, SentTransaction::Unwrap { amount })?;
        let balance = state.erc20.entry((wrapped, self.wallet)).or_default();
        if *balance < amount {
            return Err(revert(state.sent.len()).into());
        }
        *balance -= amount;
        *state.native.entry(self.wallet).or_default() += amount;
        Ok(hash)
    }
}
