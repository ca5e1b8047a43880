/// Configuration loading and access helpers
///
/// The configuration is read from TOML once at startup. Missing files fall
/// back to defaults; secrets may come from the environment instead of the
/// file (`BIRDEYE_API_KEY`, `ADMIN_API_KEY`).
use super::schemas::Config;
use crate::logger::{self, LogTag};
use crate::tokens::MAX_FRESHNESS_HOURS;
use once_cell::sync::{Lazy, OnceCell};
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

pub const BIRDEYE_API_KEY_ENV: &str = "BIRDEYE_API_KEY";
pub const ADMIN_API_KEY_ENV: &str = "ADMIN_API_KEY";

/// Load configuration from the default path (`<data>/config.toml`)
pub fn load_config() -> Result<(), String> {
    let path = crate::paths::get_config_path();
    load_config_from_path(&path)
}

/// Load configuration from a specific file path and initialize the global CONFIG
///
/// A missing file is not an error: defaults are used.
pub fn load_config_from_path(path: &Path) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Read, parse and apply environment overrides without touching the global
pub fn read_config_file(path: &Path) -> Result<Config, String> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        Config::default()
    };

    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Secrets from the environment win over the file
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var(BIRDEYE_API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.oracle.api_key = key.trim().to_string();
        }
    }
    if let Ok(key) = std::env::var(ADMIN_API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.webserver.admin_api_key = key.trim().to_string();
        }
    }
}

fn validate_config(config: &Config) -> Result<(), String> {
    if config.oracle.batch_size == 0 || config.oracle.batch_size > 100 {
        return Err(format!(
            "oracle.batch_size must be between 1 and 100 (got {})",
            config.oracle.batch_size
        ));
    }
    if config.oracle.timeout_secs == 0 {
        return Err("oracle.timeout_secs must be greater than zero".to_string());
    }
    if config.bundles.min_tokens > config.bundles.max_tokens {
        return Err(format!(
            "bundles.min_tokens ({}) exceeds bundles.max_tokens ({})",
            config.bundles.min_tokens, config.bundles.max_tokens
        ));
    }
    if !(0..=MAX_FRESHNESS_HOURS).contains(&config.tokens.freshness_hours) {
        return Err(format!(
            "tokens.freshness_hours must be between 0 and {} (got {})",
            MAX_FRESHNESS_HOURS, config.tokens.freshness_hours
        ));
    }
    if config.scheduler.interval_secs == 0 {
        return Err("scheduler.interval_secs must be greater than zero".to_string());
    }
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when `load_config` has not run (tools, tests).
///
/// ```
/// use indexboard::config::with_config;
///
/// let batch_size = with_config(|cfg| cfg.oracle.batch_size);
/// assert!(batch_size > 0);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get().map(|lock| lock.read()) {
        Some(Ok(config)) => f(&config),
        _ => f(&DEFAULT_CONFIG),
    }
}

/// Clone of the entire configuration, for use across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}
