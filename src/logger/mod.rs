//! Tagged console and file logging
//!
//! Every line carries a [`LogTag`] naming the subsystem. Debug output for a
//! subsystem is switched on with `--debug-<tag>`; `--verbose` opens all of it.
//!
//! ## Usage
//!
//! ```rust
//! use indexboard::logger::{self, LogTag};
//!
//! logger::error(LogTag::Database, "Failed to open database");
//! logger::warning(LogTag::Oracle, "Batch 2/3 failed");
//! logger::info(LogTag::Pipeline, "Cycle complete");
//! logger::debug(LogTag::Oracle, "Request body: ..."); // Only with --debug-oracle
//! logger::verbose(LogTag::Tokens, "Raw row: ...");    // Only with --verbose
//! ```
//!
//! Call [`init`] once at startup, before services start.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Read the flags and open this run's log file
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Never filtered
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Hidden by `--quiet`
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Requires `--debug-<tag>` for this tag
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Requires `--verbose` or `--verbose-<tag>`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Lets callers skip formatting debug payloads nobody will see
pub fn is_debug_enabled(tag: LogTag) -> bool {
    core::should_log(&tag, LogLevel::Debug)
}

/// Flush the buffered log file
pub fn flush() {
    file::flush_file_logging();
}
