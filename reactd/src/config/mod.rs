//! Server configuration module.
//!
//! # Architecture
//!
//! - **Global Configuration:** Network binding, reactor workers, runtime, logging
//! - **Loader:** Defaults, then TOML file, then `REACTD_*` environment, then CLI
//! - **Validation:** Every section reports all of its problems at once
//!
//! # Example
//!
//! ```toml
//! [global.network]
//! host = "0.0.0.0"
//! port = 7007
//! backlog = 1024
//!
//! [global.reactor]
//! workers = 4
//! poll_timeout_ms = 100
//! max_sessions_per_worker = 1024
//!
//! [global.logging]
//! level = "info"
//! ```

pub mod global;
pub mod loader;
pub mod validation;


pub use global::{GlobalConfig, LogLevel, LoggingConfig, NetworkConfig, RuntimeConfig};
pub use loader::{load_config, CliArgs};

use serde::{Deserialize, Serialize};

/// Master server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Global server configuration
    pub global: GlobalConfig,
}

impl ServerConfig {
    /// Validate the entire configuration.
    ///
    /// Section errors are aggregated; cross-section resource checks only
    /// produce warnings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.global.validate() {
            errors.extend(e);
        }

        for warning in validation::resource_warnings(self) {
            tracing::warn!("{}", warning);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
