use indexboard::{
    arguments::{patterns, print_debug_info, print_help},
    logger::{self, LogTag},
};

/// IndexBoard entry point
///
/// - `--help`: usage and exit
/// - `--once`: one price-update cycle, JSON summary on stdout
/// - default: scheduler + webserver until Ctrl+C
#[tokio::main]
async fn main() {
    // Logger writes into the logs directory
    if let Err(e) = indexboard::paths::ensure_all_directories() {
        eprintln!("Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init();

    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    // Secrets (BIRDEYE_API_KEY, ADMIN_API_KEY) may live in .env
    if dotenv::dotenv().is_ok() {
        logger::debug(LogTag::Config, "Loaded environment from .env");
    }

    logger::info(
        LogTag::System,
        &format!("IndexBoard v{} starting up", env!("CARGO_PKG_VERSION")),
    );
    print_debug_info();

    let result = indexboard::run::run_app().await;
    if let Err(e) = &result {
        logger::error(LogTag::System, &format!("IndexBoard failed: {:#}", e));
    } else {
        logger::info(LogTag::System, "IndexBoard stopped");
    }

    logger::flush();
    if result.is_err() {
        std::process::exit(1);
    }
}
