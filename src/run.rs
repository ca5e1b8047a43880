//! Application wiring and lifecycle
//!
//! Builds every component from the loaded configuration, then either runs a
//! single cycle (`--once`) or starts the services and waits for Ctrl+C.

use crate::{
    apis::BirdeyeClient,
    arguments,
    broadcast::ChannelBroadcaster,
    bundles::BundleService,
    config::{self, Config},
    logger::{self, LogTag},
    paths,
    pipeline::{CycleOutcome, PriceUpdater, UpdaterSettings},
    services::{implementations::PriceUpdateService, ServiceManager},
    storage::Database,
    tokens::TokenLookup,
    users::UserService,
};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Everything the services and routes share
pub struct Components {
    pub database: Arc<Database>,
    pub broadcaster: Arc<ChannelBroadcaster>,
    pub updater: Arc<PriceUpdater>,
    pub bundles: Arc<BundleService>,
    pub lookup: Arc<TokenLookup>,
    pub users: Arc<UserService>,
}

/// Configured database path, or the default under the data directory
pub fn resolve_database_path(config: &Config) -> PathBuf {
    if config.database.path.trim().is_empty() {
        paths::get_database_path()
    } else {
        PathBuf::from(config.database.path.trim())
    }
}

pub fn build_components(config: &Config) -> Result<Components> {
    let db_path = resolve_database_path(config);
    let database = Arc::new(
        Database::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );
    build_components_with_database(config, database)
}

pub fn build_components_with_database(
    config: &Config,
    database: Arc<Database>,
) -> Result<Components> {
    let oracle = Arc::new(BirdeyeClient::from_config(&config.oracle).map_err(|e| anyhow!(e))?);
    let broadcaster = Arc::new(ChannelBroadcaster::new(config.webserver.ws_buffer_size));

    let updater = Arc::new(PriceUpdater::new(
        database.clone(),
        database.clone(),
        oracle.clone(),
        broadcaster.clone(),
        UpdaterSettings::from_config(&config.oracle),
    ));
    let bundles = Arc::new(BundleService::new(
        database.clone(),
        database.clone(),
        broadcaster.clone(),
        &config.bundles,
    ));
    let lookup = Arc::new(TokenLookup::new(
        database.clone(),
        oracle,
        config.tokens.freshness_hours,
    ));

    let users = Arc::new(UserService::new(database.clone()));

    Ok(Components {
        database,
        broadcaster,
        updater,
        bundles,
        lookup,
        users,
    })
}

/// Load configuration from `--config <path>` or the default location
pub fn load_configuration() -> Result<Config> {
    let loaded = match arguments::get_config_path() {
        Some(path) => config::load_config_from_path(&PathBuf::from(path)),
        None => config::load_config(),
    };
    loaded.map_err(|e| anyhow!(e))?;

    Ok(config::get_config_clone())
}

/// Run one cycle and print its JSON summary
pub async fn run_once(components: &Components) -> Result<CycleOutcome> {
    let outcome = components.updater.run_cycle().await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome)
}

/// Full application: services until Ctrl+C
pub async fn run_app() -> Result<()> {
    let config = load_configuration()?;
    let components = build_components(&config)?;

    if arguments::is_once_enabled() {
        logger::info(LogTag::System, "Running a single price update cycle");
        run_once(&components).await?;
        return Ok(());
    }

    let mut manager = ServiceManager::new(config.clone());
    manager.register(Box::new(PriceUpdateService::from_config(
        components.updater.clone(),
        &config,
    )));

    #[cfg(feature = "web")]
    {
        use crate::services::implementations::WebserverService;
        use crate::webserver::AppState;

        let state = Arc::new(AppState::new(
            components.updater.clone(),
            components.bundles.clone(),
            components.lookup.clone(),
            components.users.clone(),
            components.database.clone(),
            components.broadcaster.clone(),
            config.webserver.admin_api_key.clone(),
        ));
        manager.register(Box::new(WebserverService::new(
            state,
            config.webserver.host.clone(),
            config.webserver.port,
        )));
    }

    manager.start_all().await.map_err(|e| anyhow!(e))?;

    wait_for_ctrl_c()?.notified().await;
    logger::warning(
        LogTag::System,
        "Shutdown signal received. Press Ctrl+C again to force exit.",
    );

    manager.stop_all().await.map_err(|e| anyhow!(e))?;
    Ok(())
}

/// Notify on the first Ctrl+C, exit the process on the second
fn wait_for_ctrl_c() -> Result<Arc<Notify>> {
    let notify = Arc::new(Notify::new());
    let signalled = Arc::new(AtomicBool::new(false));

    let handler_notify = notify.clone();
    ctrlc::set_handler(move || {
        if signalled.swap(true, Ordering::SeqCst) {
            logger::error(LogTag::System, "Second Ctrl+C detected, forcing exit");
            logger::flush();
            // 130 is the conventional exit code for SIGINT
            std::process::exit(130);
        }
        // Stores a permit, so it is not lost if nobody waits yet
        handler_notify.notify_one();
    })
    .context("Failed to install Ctrl+C handler")?;

    logger::info(LogTag::System, "Running. Press Ctrl+C to stop.");
    Ok(notify)
}
