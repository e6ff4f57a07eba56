//! Credit admission configuration

use serde::{Deserialize, Serialize};

/// Admission control settings for the credit stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    /// Balance below which no request is admitted, whatever its estimate
    pub minimum_balance: i64,

    /// Output tokens assumed per 100 prompt tokens when estimating cost
    pub estimate_output_ratio: u32,

    /// Balance seeded for the examining user by the CLI's in-memory ledger
    pub initial_balance: i64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            minimum_balance: 1,
            estimate_output_ratio: 50,
            initial_balance: 10_000,
        }
    }
}

impl CreditConfig {
    /// Validate configuration at startup
    pub fn validate(&self) -> Result<(), String> {
        if self.minimum_balance < 0 {
            return Err("minimum_balance must be >= 0".to_string());
        }

        if self.estimate_output_ratio > 1_000 {
            return Err("estimate_output_ratio must be 0-1000".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_config_defaults() {
        let config = CreditConfig::default();
        assert_eq!(config.minimum_balance, 1);
        assert_eq!(config.estimate_output_ratio, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credit_config_validation_negative_minimum() {
        let config = CreditConfig {
            minimum_balance: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credit_config_validation_output_percent() {
        let config = CreditConfig {
            estimate_output_ratio: 1_001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
