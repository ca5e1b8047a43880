/// Centralized argument handling for IndexBoard
///
/// Stores the process arguments once so that any module can check for
/// run-mode switches and per-module debug flags without threading them
/// through every call.
///
/// Supported switches:
/// - `--once`      run a single price-update cycle and exit
/// - `--no-web`    do not start the HTTP/WebSocket server
/// - `--config <path>` load configuration from a custom TOML file
/// - `--debug-<module>` enable debug logs for a module (see [`LogTag`])
/// - `--verbose`   enable verbose logs everywhere
///
/// [`LogTag`]: crate::logger::LogTag
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Overrides the stored arguments (binaries and tests)
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value following a flag, if any
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

// =============================================================================
// RUN MODES
// =============================================================================

/// Run one price-update cycle and exit
pub fn is_once_enabled() -> bool {
    has_arg("--once")
}

/// Skip starting the webserver
pub fn is_no_web_enabled() -> bool {
    has_arg("--no-web")
}

/// Custom config file path
pub fn get_config_path() -> Option<String> {
    get_arg_value("--config")
}

/// All `--debug-<module>` flags present, without the prefix
pub fn get_enabled_debug_modes() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-"))
        .map(|m| m.to_string())
        .collect()
}

pub fn is_any_debug_enabled() -> bool {
    !get_enabled_debug_modes().is_empty()
}

/// Print help
pub fn print_help() {
    println!("IndexBoard - token index price tracker");
    println!();
    println!("USAGE:");
    println!("    indexboard [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --once                 Run a single price-update cycle and exit");
    println!("    --no-web               Do not start the HTTP/WebSocket server");
    println!("    --config <PATH>        Load configuration from PATH");
    println!("    --verbose, -v          Enable verbose logging");
    println!("    --quiet                Only show warnings and errors");
    println!("    --help, -h             Show this help");
    println!();
    println!("DEBUG FLAGS:");
    println!("    --debug-oracle         Price oracle requests and responses");
    println!("    --debug-pipeline       Price-update cycle state transitions");
    println!("    --debug-tokens         Token store and lookups");
    println!("    --debug-bundles        Bundle store and metrics");
    println!("    --debug-users          User profile sync");
    println!("    --debug-broadcast      Real-time event publishing");
    println!("    --debug-database       SQLite operations");
    println!("    --debug-webserver      HTTP and WebSocket handling");
}

/// Print enabled debug modes at startup
pub fn print_debug_info() {
    let modes = get_enabled_debug_modes();
    if !modes.is_empty() {
        println!("Debug modes enabled: {}", modes.join(", "));
    }
}

/// Common argument patterns
pub mod patterns {
    use super::*;

    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    pub fn is_quiet_mode() -> bool {
        has_arg("--quiet") || has_arg("-q")
    }

    pub fn is_verbose_mode() -> bool {
        has_arg("--verbose") || has_arg("-v")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: CMD_ARGS is process-global and tests run in parallel
    #[test]
    fn test_argument_parsing() {
        set_cmd_args(vec![
            "indexboard".to_string(),
            "--once".to_string(),
            "--debug-oracle".to_string(),
            "--config".to_string(),
            "/tmp/indexboard.toml".to_string(),
            "--debug-pipeline".to_string(),
        ]);

        assert!(is_once_enabled());
        assert!(!is_no_web_enabled());
        assert!(!patterns::is_help_requested());
        assert_eq!(get_config_path(), Some("/tmp/indexboard.toml".to_string()));
        assert_eq!(get_arg_value("--missing"), None);

        let modes = get_enabled_debug_modes();
        assert_eq!(modes, vec!["oracle".to_string(), "pipeline".to_string()]);
        assert!(is_any_debug_enabled());

        set_cmd_args(vec!["indexboard".to_string(), "--help".to_string()]);
        assert!(patterns::is_help_requested());
        assert!(!is_any_debug_enabled());
    }
}
