//! Global server configuration.
//!
//! This module defines configuration settings that apply server-wide,
//! including network binding, reactor workers, runtime configuration,
//! and logging.

use crate::netio::ReactorConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Global server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Network binding configuration
    pub network: NetworkConfig,

    /// Worker threads and poll reactor configuration
    pub reactor: ReactorConfig,

    /// Runtime (async executor) configuration
    pub runtime: RuntimeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Telemetry configuration
    pub telemetry: crate::telemetry::TelemetryConfig,
}

impl GlobalConfig {
    /// Validate global configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.network.validate() {
            errors.extend(e);
        }

        if let Err(e) = self.reactor.validate() {
            errors.extend(e);
        }

        if let Err(e) = self.runtime.validate() {
            errors.extend(e);
        }

        if let Err(e) = self.telemetry.validate() {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Network binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host address to bind to.
    ///
    /// Examples:
    /// - `"0.0.0.0"` - Bind to all IPv4 interfaces
    /// - `"::"` - Bind to all IPv6 interfaces
    /// - `"127.0.0.1"` - Localhost only (testing)
    ///
    /// **Default:** `"0.0.0.0"`
    pub host: String,

    /// TCP port to bind to. `0` lets the OS pick one.
    ///
    /// **Default:** `7007`
    pub port: u16,

    /// Enable SO_REUSEADDR socket option.
    ///
    /// Allows binding to a port that was recently closed.
    ///
    /// **Default:** `true`
    pub reuse_addr: bool,

    /// Listen backlog for each worker's listener.
    ///
    /// **Default:** `1024`
    pub backlog: i32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7007,
            reuse_addr: true,
            backlog: 1024,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host.parse::<std::net::IpAddr>().is_err() {
            errors.push(format!("Invalid host address: {}", self.host));
        }

        if self.backlog <= 0 {
            errors.push(format!("network.backlog must be > 0, got {}", self.backlog));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Socket address built from `host` and `port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let ip: std::net::IpAddr = self
            .host
            .parse()
            .map_err(|_| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Runtime configuration for the async executor.
///
/// The runtime only hosts signal handling; network I/O runs on the reactor
/// worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of worker threads for the Tokio runtime.
    ///
    /// **Default:** `1`
    pub worker_threads: usize,

    /// Maximum number of blocking threads in the pool.
    ///
    /// **Default:** 4
    pub max_blocking_threads: usize,

    /// Thread name prefix for runtime threads.
    ///
    /// **Default:** `"reactd-runtime"`
    pub thread_name: String,

    /// Stack size for each thread in bytes.
    ///
    /// **Default:** 2 MB
    pub thread_stack_size: usize,

    /// Seconds to wait for runtime tasks at shutdown.
    ///
    /// **Default:** 5
    pub shutdown_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 1,
            max_blocking_threads: 4,
            thread_name: "reactd-runtime".to_string(),
            thread_stack_size: 2 * 1024 * 1024, // 2MB
            shutdown_timeout_secs: 5,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.worker_threads == 0 {
            errors.push("worker_threads must be > 0".to_string());
        }

        if self.worker_threads > 1024 {
            errors.push("worker_threads is unreasonably high (> 1024)".to_string());
        }

        if self.max_blocking_threads == 0 {
            errors.push("max_blocking_threads must be > 0".to_string());
        }

        if self.thread_stack_size < 128 * 1024 {
            errors.push("thread_stack_size too small (< 128 KB)".to_string());
        }

        if self.thread_stack_size > 64 * 1024 * 1024 {
            errors.push("thread_stack_size too large (> 64 MB)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for the entire application.
    /// `RUST_LOG`, when set, takes precedence.
    ///
    /// **Default:** `Info`
    pub level: LogLevel,

    /// Enable ANSI color codes in logs.
    ///
    /// Disable when logging to files or non-TTY outputs.
    ///
    /// **Default:** `true`
    pub enable_colors: bool,

    /// Include source file and line number in logs.
    ///
    /// **Default:** `false`
    pub include_file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_colors: true,
            include_file_line: false,
        }
    }
}

/// Log level enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}
