/// Configuration schemas - every config structure defined once with defaults
use crate::config_struct;

// ============================================================================
// PRICE ORACLE
// ============================================================================

config_struct! {
    /// Birdeye price oracle settings
    pub struct OracleConfig {
        /// Disable to run cycles without network access (every batch fails)
        enabled: bool = true,
        base_url: String = "https://public-api.birdeye.so".to_string(),
        /// Overridden by BIRDEYE_API_KEY
        api_key: String = String::new(),
        chain: String = "solana".to_string(),
        /// Addresses per multi_price call (provider limit is 100)
        batch_size: usize = 100,
        /// Fixed pause after every batch, success or failure
        batch_delay_ms: u64 = 1000,
        timeout_secs: u64 = 10,
    }
}

// ============================================================================
// STORAGE
// ============================================================================

config_struct! {
    pub struct DatabaseConfig {
        /// Empty means `<data>/indexboard.db`
        path: String = String::new(),
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

config_struct! {
    /// Periodic price-update trigger
    pub struct SchedulerConfig {
        enabled: bool = true,
        interval_secs: u64 = 60,
        /// Run a cycle immediately at startup instead of waiting one interval
        run_on_start: bool = true,
    }
}

// ============================================================================
// WEBSERVER
// ============================================================================

config_struct! {
    pub struct WebserverConfig {
        enabled: bool = true,
        host: String = "127.0.0.1".to_string(),
        port: u16 = 3000,
        /// Required in the `authorization` header of admin routes. Overridden by ADMIN_API_KEY
        admin_api_key: String = String::new(),
        /// Per-subscriber event buffer of the broadcast channel
        ws_buffer_size: usize = 256,
    }
}

// ============================================================================
// TOKENS & BUNDLES
// ============================================================================

config_struct! {
    pub struct TokensConfig {
        /// Stored token details younger than this are served without an oracle call
        freshness_hours: i64 = 24,
    }
}

config_struct! {
    pub struct BundlesConfig {
        min_tokens: usize = 5,
        max_tokens: usize = 20,
        /// Active bundles one creator may hold at a time; 0 disables the cap
        max_active_per_creator: usize = 5,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        oracle: OracleConfig = OracleConfig::default(),
        database: DatabaseConfig = DatabaseConfig::default(),
        scheduler: SchedulerConfig = SchedulerConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
        tokens: TokensConfig = TokensConfig::default(),
        bundles: BundlesConfig = BundlesConfig::default(),
    }
}
