use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/admin/reset-leaderboard", post(reset_leaderboard))
}

/// Header must equal the configured admin key; no key configured means no access
fn is_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    if state.admin_api_key.is_empty() {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == state.admin_api_key)
        .unwrap_or(false)
}

async fn reset_leaderboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !is_authorized(&state, &headers) {
        logger::warning(LogTag::Webserver, "Rejected unauthorized leaderboard reset");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match state.bundles.reset_leaderboard().await {
        Ok(updated_count) => Json(json!({
            "success": true,
            "message": "Leaderboard reset successfully. All existing bundles marked as inactive.",
            "updatedCount": updated_count,
        }))
        .into_response(),
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Error resetting leaderboard: {}", e),
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
