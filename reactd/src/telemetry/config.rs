use serde::{Deserialize, Serialize};

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line and to every worker span.
    pub service_name: String,

    /// Log per-worker session statistics when a worker exits (default: true).
    pub log_worker_stats: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "reactd".to_string(),
            log_worker_stats: true,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        if self.service_name.trim().is_empty() {
            return Err(vec!["telemetry.service_name must not be empty".to_string()]);
        }
        Ok(())
    }
}
