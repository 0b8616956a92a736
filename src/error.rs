use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised while talking to the chain through the read or broadcast RPC.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("failed to submit transaction: {0}")]
    Submit(String),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
}

/// Direction of a cross-layer transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeDirection {
    /// HyperEVM to HyperCore.
    ToCore,
    /// HyperCore to HyperEVM.
    ToEvm,
}

impl std::fmt::Display for BridgeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToCore => write!(f, "evm->core"),
            Self::ToEvm => write!(f, "core->evm"),
        }
    }
}

/// Leg of the two-stage swap routed through USDC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStage {
    AssetToUsdc,
    UsdcToAsset,
}

impl std::fmt::Display for SwapStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetToUsdc => write!(f, "asset->usdc"),
            Self::UsdcToAsset => write!(f, "usdc->asset"),
        }
    }
}

/// Rebalancing failures.
///
/// Gas-price and market-condition errors are transient and retried on the next cycle.
/// Wallet configuration errors are fatal to the process loop.
#[derive(Error, Debug, Clone)]
pub enum RebalanceError {
    #[error("precompile read failed at {precompile}: {reason}")]
    PrecompileReadFailure { precompile: Address, reason: String },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("trade value ${value} below minimum ${minimum}")]
    BelowMinimumTradeValue { value: Decimal, minimum: Decimal },

    #[error("gas price {observed_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh {
        observed_gwei: Decimal,
        max_gwei: Decimal,
    },

    #[error("bridge {direction} failed: {reason}")]
    BridgeFailed {
        direction: BridgeDirection,
        reason: String,
    },

    #[error("swap {stage} failed: {reason}")]
    SwapFailed { stage: SwapStage, reason: String },

    #[error("swap not completed: expected {expected}, received {actual}")]
    SwapNotCompleted { expected: U256, actual: U256 },

    #[error("wrap/unwrap failed: {0}")]
    WrapUnwrapFailed(String),

    #[error("missing execution parameter: {0}")]
    MissingExecutionParameters(&'static str),

    #[error("no USD market found for token index {token_index}")]
    NoUsdMarketFound { token_index: u32 },

    #[error("self-transfer to {0} rejected")]
    SelfTransfer(Address),

    #[error("wallet configuration error: {0}")]
    WalletConfigurationError(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Rebalance(#[from] RebalanceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the process loop must stop instead of retrying next cycle.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Rebalance(RebalanceError::WalletConfigurationError(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_and_config_errors_are_fatal() {
        let wallet: Error = RebalanceError::WalletConfigurationError("mismatch".into()).into();
        let config: Error = ConfigError::MissingField { field: "targets" }.into();
        assert!(wallet.is_fatal());
        assert!(config.is_fatal());
    }

    #[test]
    fn market_conditions_are_transient() {
        let gas: Error = RebalanceError::GasPriceTooHigh {
            observed_gwei: Decimal::from(75),
            max_gwei: Decimal::from(50),
        }
        .into();
        let read: Error = ChainError::Read("timeout".into()).into();
        let reverted: Error = ChainError::Reverted {
            tx_hash: B256::repeat_byte(1),
        }
        .into();
        assert!(!gas.is_fatal());
        assert!(!read.is_fatal());
        assert!(!reverted.is_fatal());
    }
}
