//! Configuration module for Examen
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`EXAMEN_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use examen::config::ExamenConfig;
//!
//! // Load defaults
//! let config = ExamenConfig::default();
//! assert_eq!(config.pipeline.unit_price, 1);
//!
//! // Parse from TOML
//! let toml = r#"
//! [pipeline]
//! unit_price = 3
//! "#;
//! let config: ExamenConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.pipeline.unit_price, 3);
//! ```

pub mod backend;
pub mod business;
pub mod credit;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use backend::{BackendType, ProviderConfig};
pub use business::BusinessConfig;
pub use credit::CreditConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Unified configuration for the examination pipeline.
///
/// # Example
///
/// ```rust
/// use examen::config::ExamenConfig;
///
/// let config = ExamenConfig::default();
/// assert_eq!(config.pipeline.request_timeout_secs, 60);
/// assert!(config.providers.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExamenConfig {
    /// Terminal platform settings
    pub pipeline: PipelineConfig,
    /// Admission control
    pub credit: CreditConfig,
    /// Language-model providers
    pub providers: Vec<ProviderConfig>,
    /// Per-business settings keyed by business key
    pub businesses: HashMap<String, BusinessConfig>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ExamenConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports EXAMEN_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("EXAMEN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("EXAMEN_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(price) = std::env::var("EXAMEN_UNIT_PRICE") {
            if let Ok(p) = price.parse() {
                self.pipeline.unit_price = p;
            }
        }
        if let Ok(provider) = std::env::var("EXAMEN_PROVIDER") {
            if !provider.is_empty() {
                self.pipeline.provider = provider;
            }
        }
        if let Ok(timeout) = std::env::var("EXAMEN_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.pipeline.request_timeout_secs = t;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.unit_price < 0 {
            return Err(ConfigError::Validation {
                field: "pipeline.unit_price".to_string(),
                message: "unit price must be >= 0".to_string(),
            });
        }
        if self.pipeline.request_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "pipeline.request_timeout_secs".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        self.credit
            .validate()
            .map_err(|message| ConfigError::Validation {
                field: "credit".to_string(),
                message,
            })?;

        let mut names = HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].name", i),
                    message: "name cannot be empty".to_string(),
                });
            }
            if provider.url.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].url", i),
                    message: "URL cannot be empty".to_string(),
                });
            }
            if provider.model.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].model", i),
                    message: "model cannot be empty".to_string(),
                });
            }
            if provider.backend_type != BackendType::Generic && provider.credential_count() == 0 {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].api_keys", i),
                    message: "at least one API key or api_key_envs entry is required".to_string(),
                });
            }
            if provider.backend_type == BackendType::Generic && provider.instances == 0 {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].instances", i),
                    message: "instances must be non-zero".to_string(),
                });
            }
            if !names.insert(provider.name.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("providers[{}].name", i),
                    message: format!("duplicate provider name '{}'", provider.name),
                });
            }
        }

        if self.active_provider().is_none() {
            return Err(ConfigError::UnknownProvider(self.pipeline.provider.clone()));
        }

        Ok(())
    }

    /// Provider selected by `[pipeline].provider`
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.name == self.pipeline.provider)
    }

    /// Deadline applied to each examination
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.request_timeout_secs)
    }
}
