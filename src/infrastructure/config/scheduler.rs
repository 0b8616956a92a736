//! Loop timing and settlement polling.

use std::time::Duration;

use serde::Deserialize;

use crate::application::SettlementPolicy;

/// Pauses of the process loop and the settlement poll budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause after every target has been visited.
    pub cycle_interval_secs: u64,
    /// Pause between two targets of the same cycle.
    pub target_pause_secs: u64,
    pub settlement_poll_interval_ms: u64,
    pub settlement_poll_attempts: u32,
}

impl SchedulerConfig {
    #[must_use]
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    #[must_use]
    pub fn target_pause(&self) -> Duration {
        Duration::from_secs(self.target_pause_secs)
    }

    #[must_use]
    pub fn settlement(&self) -> SettlementPolicy {
        SettlementPolicy {
            interval: Duration::from_millis(self.settlement_poll_interval_ms),
            attempts: self.settlement_poll_attempts,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 300,
            target_pause_secs: 5,
            settlement_poll_interval_ms: 2_000,
            settlement_poll_attempts: 30,
        }
    }
}
