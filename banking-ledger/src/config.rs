//! Configuration for the ledger

use crate::types::{Amount, Timestamp};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Default delay between a payment and its cashback (one day in ms)
pub const DEFAULT_MATURATION_PERIOD: Timestamp = 86_400_000;

/// Default cashback rate in basis points (2%)
pub const DEFAULT_CASHBACK_RATE_BPS: u32 = 200;

const BPS_DENOMINATOR: i128 = 10_000;

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Cashback configuration
    pub cashback: CashbackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "banking-ledger".to_string(),
            cashback: CashbackConfig::default(),
        }
    }
}

/// Cashback configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashbackConfig {
    /// Time units between a payment and its cashback credit
    pub maturation_period: Timestamp,

    /// Cashback rate in basis points of the payment amount
    pub rate_bps: u32,
}

impl Default for CashbackConfig {
    fn default() -> Self {
        Self {
            maturation_period: DEFAULT_MATURATION_PERIOD,
            rate_bps: DEFAULT_CASHBACK_RATE_BPS,
        }
    }
}

impl CashbackConfig {
    /// Cashback owed on a payment, floored to whole units
    pub fn cashback_for(&self, amount: Amount) -> Amount {
        let cashback = i128::from(amount) * i128::from(self.rate_bps) / BPS_DENOMINATOR;
        // rate_bps <= 10_000 keeps the result within the payment amount
        Amount::try_from(cashback).unwrap_or(Amount::MAX)
    }

    /// Maturity timestamp of a payment made at `ts`
    pub fn maturity_of(&self, ts: Timestamp) -> Timestamp {
        ts.saturating_add(self.maturation_period)
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("LEDGER_SERVICE_NAME") {
            config.service_name = name;
        }

        if let Ok(period) = std::env::var("LEDGER_MATURATION_PERIOD") {
            config.cashback.maturation_period = period.parse().map_err(|e| {
                LedgerError::Config(format!("Invalid LEDGER_MATURATION_PERIOD '{}': {}", period, e))
            })?;
        }

        if let Ok(rate) = std::env::var("LEDGER_CASHBACK_RATE_BPS") {
            config.cashback.rate_bps = rate.parse().map_err(|e| {
                LedgerError::Config(format!("Invalid LEDGER_CASHBACK_RATE_BPS '{}': {}", rate, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cashback.maturation_period <= 0 {
            return Err(LedgerError::Config(format!(
                "maturation_period must be positive, got {}",
                self.cashback.maturation_period
            )));
        }
        if i128::from(self.cashback.rate_bps) > BPS_DENOMINATOR {
            return Err(LedgerError::Config(format!(
                "rate_bps must not exceed {}, got {}",
                BPS_DENOMINATOR, self.cashback.rate_bps
            )));
        }
        Ok(())
    }
}
