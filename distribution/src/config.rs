//! Configuration for the distribution engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Distribution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ledger data directory
    pub ledger_data_dir: PathBuf,

    /// Fee configuration
    pub fees: FeeConfig,

    /// Deposit limits
    pub deposits: DepositConfig,

    /// Mock gateway tuning
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "distribution".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger_data_dir: PathBuf::from("./data/wallet-ledger"),
            fees: FeeConfig::default(),
            deposits: DepositConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Fee configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Platform fee as a fraction of distributed revenue (0.05 = 5%)
    pub platform_fee_pct: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            platform_fee_pct: Decimal::new(5, 2), // 5%
        }
    }
}

/// Deposit limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    /// Minimum accepted deposit
    pub min_amount: Decimal,

    /// Maximum accepted deposit
    pub max_amount: Decimal,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::from(100),
            max_amount: Decimal::from(100_000),
        }
    }
}

/// Mock gateway tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Simulated provider latency (milliseconds)
    pub latency_ms: u64,

    /// Simulated success rate (0.0 - 1.0)
    pub success_rate: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            latency_ms: 50,
            success_rate: 0.95,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("DISTRIBUTION_LEDGER_DIR") {
            config.ledger_data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validate configuration bounds
    pub fn validate(&self) -> crate::Result<()> {
        if self.fees.platform_fee_pct < Decimal::ZERO || self.fees.platform_fee_pct >= Decimal::ONE
        {
            return Err(crate::Error::Config(format!(
                "platform_fee_pct must be in [0, 1), got {}",
                self.fees.platform_fee_pct
            )));
        }
        if self.deposits.min_amount > self.deposits.max_amount {
            return Err(crate::Error::Config(
                "deposit min_amount exceeds max_amount".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fees.platform_fee_pct, Decimal::new(5, 2));
        assert_eq!(config.deposits.min_amount, Decimal::from(100));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_fee_rejected() {
        let mut config = Config::default();
        config.fees.platform_fee_pct = Decimal::ONE;
        assert!(config.validate().is_err());
    }
}
