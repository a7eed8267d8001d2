//! Configuration loading and parsing.
//!
//! This module handles loading configuration from files, environment variables,
//! and command-line arguments, with proper precedence handling.

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use config::{Config as ConfigLoader, Environment};
use std::path::Path;

use super::ServerConfig;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "REACTD";

/// Command-line interface for the server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, short = 'c', default_value = "reactd.toml")]
    pub config: String,

    /// Host address to bind to (overrides config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Number of reactor worker threads (overrides config file)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Print default configuration and exit
    #[arg(long)]
    pub print_default_config: bool,
}

/// Load and parse server configuration.
///
/// This function implements the configuration precedence:
/// 1. Default values (lowest priority)
/// 2. Configuration file
/// 3. Environment variables (REACTD_ prefix)
/// 4. Command-line arguments (highest priority)
///
/// `--print-default-config` and `--validate` exit the process after
/// printing their result.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration file cannot be parsed
/// - Validation fails
pub fn load_config() -> Result<ServerConfig> {
    let matches = CliArgs::command().get_matches();
    let cli =
        CliArgs::from_arg_matches(&matches).context("Failed to parse command-line arguments")?;

    if cli.print_default_config {
        print_default_config()?;
        std::process::exit(0);
    }

    let config = resolve_config(&cli, environment())?;

    if cli.validate {
        println!("✓ Configuration is valid");
        std::process::exit(0);
    }

    Ok(config)
}

/// Environment source for `REACTD_SECTION__KEY` style variables.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Build and validate the configuration for already-parsed arguments.
pub fn resolve_config(cli: &CliArgs, env: Environment) -> Result<ServerConfig> {
    let mut config = load_config_file(&cli.config)?;

    apply_env_overrides(&mut config, env)?;
    apply_cli_overrides(&mut config, cli);

    config.validate().map_err(|errors| {
        anyhow::anyhow!("Configuration validation failed:\n{}", errors.join("\n"))
    })?;

    Ok(config)
}

/// Load configuration from a TOML file, or defaults if it does not exist.
pub(crate) fn load_config_file(path: &str) -> Result<ServerConfig> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        tracing::warn!(
            config_path = %path,
            "Configuration file not found, using defaults"
        );
        return Ok(ServerConfig::default());
    }

    let config_str = std::fs::read_to_string(path_obj)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    toml::from_str(&config_str).with_context(|| format!("Failed to parse TOML config: {}", path))
}

/// Apply environment variable overrides.
///
/// Environment variables are prefixed with `REACTD_` and use `__` as a separator.
///
/// Examples:
/// - `REACTD_GLOBAL__NETWORK__HOST=127.0.0.1`
/// - `REACTD_GLOBAL__REACTOR__WORKERS=4`
/// - `REACTD_GLOBAL__LOGGING__LEVEL=debug`
pub(crate) fn apply_env_overrides(config: &mut ServerConfig, env: Environment) -> Result<()> {
    let env_config = ConfigLoader::builder()
        .add_source(env)
        .build()
        .context("Failed to load environment variables")?;

    // Only known keys are applied; unrelated REACTD_* variables are ignored.
    if let Ok(host) = env_config.get_string("global.network.host") {
        config.global.network.host = host;
    }
    if let Ok(port) = env_config.get_int("global.network.port") {
        config.global.network.port = u16::try_from(port)
            .with_context(|| format!("{}_GLOBAL__NETWORK__PORT out of range: {}", ENV_PREFIX, port))?;
    }
    if let Ok(workers) = env_config.get_int("global.reactor.workers") {
        config.global.reactor.workers = usize::try_from(workers).with_context(|| {
            format!("{}_GLOBAL__REACTOR__WORKERS out of range: {}", ENV_PREFIX, workers)
        })?;
    }
    if let Ok(timeout) = env_config.get_int("global.reactor.poll_timeout_ms") {
        config.global.reactor.poll_timeout_ms = u64::try_from(timeout).with_context(|| {
            format!("{}_GLOBAL__REACTOR__POLL_TIMEOUT_MS out of range: {}", ENV_PREFIX, timeout)
        })?;
    }
    if let Ok(level) = env_config.get_string("global.logging.level") {
        if let Ok(parsed_level) = level.parse() {
            config.global.logging.level = parsed_level;
        } else {
            tracing::warn!(level = %level, "Invalid log level in environment, ignoring");
        }
    }

    Ok(())
}

/// Apply command-line argument overrides.
pub(crate) fn apply_cli_overrides(config: &mut ServerConfig, cli: &CliArgs) {
    if let Some(ref host) = cli.host {
        config.global.network.host = host.clone();
    }

    if let Some(port) = cli.port {
        config.global.network.port = port;
    }

    if let Some(workers) = cli.workers {
        config.global.reactor.workers = workers;
    }

    if let Some(ref level_str) = cli.log_level {
        if let Ok(level) = level_str.parse() {
            config.global.logging.level = level;
        } else {
            tracing::warn!(level = %level_str, "Invalid log level specified, ignoring");
        }
    }
}

/// Print the default configuration in TOML format.
fn print_default_config() -> Result<()> {
    let default_config = ServerConfig::default();
    let toml_str =
        toml::to_string_pretty(&default_config).context("Failed to serialize default config")?;
    println!("{}", toml_str);
    Ok(())
}
