//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the signing key comes from the
//! `WALLET_PRIVATE_KEY` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use hyperbalance::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::logging::LoggingConfig;
use super::network::NetworkConfig;
use super::scheduler::SchedulerConfig;
use super::wallet::WalletConfig;
use crate::domain::{GasConfig, TargetConfig};
use crate::error::{ConfigError, Result};

/// Largest drift threshold: at 50% both sides are always below or at it.
const MAX_DRIFT_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Main application configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,

    /// Gas ceiling and native reserve.
    #[serde(default)]
    pub gas: GasConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Vaults to keep balanced, visited in order.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Private key is loaded from `WALLET_PRIVATE_KEY`.
    #[serde(default)]
    pub wallet: WalletConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Never from the config file
        config.wallet.private_key = std::env::var("WALLET_PRIVATE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is malformed or
    /// validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// The signing key, required by every command that sends transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if `WALLET_PRIVATE_KEY` is not set.
    pub fn private_key(&self) -> Result<&str> {
        self.wallet.private_key.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            }
            .into()
        })
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.network.read_rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "read_rpc_url",
            }
            .into());
        }
        if self.network.broadcast_rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "broadcast_rpc_url",
            }
            .into());
        }
        for (field, url) in [
            ("read_rpc_url", &self.network.read_rpc_url),
            ("broadcast_rpc_url", &self.network.broadcast_rpc_url),
        ] {
            url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }

        if self.gas.max_gas_price_gwei <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "max_gas_price_gwei",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.gas.gas_reserve < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "gas_reserve",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }

        if self.scheduler.settlement_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "settlement_poll_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.targets.is_empty() {
            return Err(ConfigError::MissingField { field: "targets" }.into());
        }

        let mut names = HashSet::new();
        let mut vaults = HashSet::new();
        for target in &self.targets {
            validate_target(target)?;
            if !names.insert(target.vault_name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "vault_name",
                    reason: format!("duplicate vault name '{}'", target.vault_name),
                }
                .into());
            }
            if !vaults.insert(target.vault_address) {
                return Err(ConfigError::InvalidValue {
                    field: "vault_address",
                    reason: format!("duplicate vault address {}", target.vault_address),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[allow(clippy::result_large_err)]
fn validate_target(target: &TargetConfig) -> Result<()> {
    if target.vault_name.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "vault_name",
        }
        .into());
    }
    let threshold = target.drift_threshold_percent;
    if threshold <= Decimal::ZERO || threshold > MAX_DRIFT_THRESHOLD {
        return Err(ConfigError::InvalidValue {
            field: "drift_threshold_percent",
            reason: format!("{threshold} for '{}' must be in (0, 50]", target.vault_name),
        }
        .into());
    }
    if target.min_trade_value_usd < Decimal::ZERO {
        return Err(ConfigError::InvalidValue {
            field: "min_trade_value_usd",
            reason: format!("must be 0 or greater for '{}'", target.vault_name),
        }
        .into());
    }
    if target.base_token.address == target.quote_token.address {
        return Err(ConfigError::InvalidValue {
            field: "quote_token",
            reason: format!("base and quote are the same token for '{}'", target.vault_name),
        }
        .into());
    }
    Ok(())
}
