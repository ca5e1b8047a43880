use crate::webserver::state::AppState;
use axum::Router;
use std::sync::Arc;

pub mod admin;
pub mod bundles;
pub mod cron;
pub mod system;
pub mod tokens;
pub mod users;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(ws::routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(cron::routes())
        .merge(tokens::routes())
        .merge(bundles::routes())
        .merge(users::routes())
        .merge(admin::routes())
        .merge(system::routes())
}
