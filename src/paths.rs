//! Centralized path resolution for IndexBoard
//!
//! All file and directory paths are resolved through this module so the
//! binary, the tools and the tests agree on where data lives.
//!
//! ## Base directory
//!
//! - `$INDEXBOARD_HOME` when set
//! - otherwise the platform data directory (`dirs::data_local_dir()`),
//!   e.g. `~/.local/share/IndexBoard/` on Linux
//!
//! ## Directory Structure
//!
//! ```text
//! IndexBoard/
//! ├── data/
//! │   ├── config.toml
//! │   └── indexboard.db
//! └── logs/
//!     └── indexboard_*.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "IndexBoard";

/// Environment override for the base directory
pub const HOME_ENV_VAR: &str = "INDEXBOARD_HOME";

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV_VAR) {
        if !home.trim().is_empty() {
            return PathBuf::from(home);
        }
    }

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

// =============================================================================
// DIRECTORY ACCESSORS
// =============================================================================

pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Databases and config
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

// =============================================================================
// FILE PATHS
// =============================================================================

/// Returns the main configuration file path
pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Default SQLite database holding tokens and bundles
pub fn get_database_path() -> PathBuf {
    get_data_directory().join("indexboard.db")
}

/// Create every directory the application writes into
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_base_directory(), get_data_directory(), get_logs_directory()] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_rooted_at_base() {
        let base = get_base_directory();
        assert!(get_config_path().starts_with(&base));
        assert!(get_database_path().ends_with("data/indexboard.db"));
        assert!(get_logs_directory().ends_with("logs"));
    }
}
