//! Structured logging
//!
//! Filter construction, subscriber initialization, trial ID generation and
//! field helpers used by the logging stage.

pub mod fields;
pub mod trial;

pub use fields::{extract_status, truncate_inputs, truncate_string};
pub use trial::generate_trial_id;

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build filter directives string from LoggingConfig
///
/// # Examples
///
/// ```
/// use examen::config::LoggingConfig;
/// use examen::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("pipeline".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     component_levels: Some(component_levels),
///     ..LoggingConfig::default()
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,examen::pipeline=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",examen::{}={}", component, level));
        }
    }

    filter_str
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` wins over the configured directives when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. User answers will be logged.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
