/// Shared application state for the webserver
///
/// Everything route handlers need, injected once at startup.
use crate::broadcast::ChannelBroadcaster;
use crate::bundles::BundleService;
use crate::pipeline::PriceUpdater;
use crate::storage::TokenStore;
use crate::tokens::TokenLookup;
use crate::users::UserService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub updater: Arc<PriceUpdater>,
    pub bundles: Arc<BundleService>,
    pub lookup: Arc<TokenLookup>,
    pub users: Arc<UserService>,
    pub token_store: Arc<dyn TokenStore>,
    /// Source of events forwarded to WebSocket clients
    pub broadcaster: Arc<ChannelBroadcaster>,
    /// Expected `authorization` header value for admin routes; empty disables them
    pub admin_api_key: String,
    pub ws_connections: Arc<AtomicUsize>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        updater: Arc<PriceUpdater>,
        bundles: Arc<BundleService>,
        lookup: Arc<TokenLookup>,
        users: Arc<UserService>,
        token_store: Arc<dyn TokenStore>,
        broadcaster: Arc<ChannelBroadcaster>,
        admin_api_key: String,
    ) -> Self {
        Self {
            updater,
            bundles,
            lookup,
            users,
            token_store,
            broadcaster,
            admin_api_key,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Relaxed)
    }

    pub fn increment_ws_connections(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_ws_connections(&self) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
