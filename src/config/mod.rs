//! Configuration system
//!
//! - `config_struct!` for single-source struct + default definitions
//! - TOML loading with environment overrides for secrets
//! - Global read access through [`with_config`]

#[macro_use]
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, get_config_clone, load_config, load_config_from_path, read_config_file,
    with_config,
};
