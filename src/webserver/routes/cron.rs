/// Price-update trigger
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    errors::CycleError,
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/cron/update-prices", get(update_prices))
}

/// Run one cycle and return its summary
///
/// 409 when a cycle is already in progress, 500 when tokens or bundles
/// could not be loaded.
async fn update_prices(State(state): State<Arc<AppState>>) -> Response {
    logger::info(LogTag::Webserver, "Price update triggered via HTTP");

    match state.updater.run_cycle().await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(CycleError::AlreadyRunning) => error_response(
            StatusCode::CONFLICT,
            &CycleError::AlreadyRunning.to_string(),
        ),
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Error updating token prices: {}", e),
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
