use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    bundles::{DeleteBundle, NewBundle},
    errors::BundleError,
    logger::{self, LogTag},
    webserver::{
        state::AppState,
        utils::{error_response, success_response},
    },
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bundles", get(list_bundles).post(create_bundle))
        .route("/bundles/:id", get(get_bundle).delete(delete_bundle))
        .route("/leaderboard", get(leaderboard))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// Map a bundle failure to its HTTP status
fn bundle_error_response(error: BundleError) -> Response {
    match &error {
        BundleError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Bundle not found"),
        BundleError::Forbidden => error_response(StatusCode::FORBIDDEN, &error.to_string()),
        e if e.is_validation() => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        e => {
            logger::error(LogTag::Webserver, &format!("Bundle request failed: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn create_bundle(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewBundle>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    match state.bundles.create(request).await {
        Ok(bundle) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Bundle created successfully",
                "data": bundle,
            })),
        )
            .into_response(),
        Err(e) => bundle_error_response(e),
    }
}

async fn list_bundles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BundleListQuery>,
) -> Response {
    match state.bundles.list(query.user_id.as_deref()).await {
        Ok(bundles) => success_response(bundles),
        Err(e) => bundle_error_response(e),
    }
}

async fn get_bundle(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.bundles.detail(&id).await {
        Ok(detail) => success_response(detail),
        Err(e) => bundle_error_response(e),
    }
}

/// The body is optional; anything unparsable counts as an anonymous request
async fn delete_bundle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let request: DeleteBundle = serde_json::from_slice(&body).unwrap_or_default();

    match state.bundles.delete(&id, request.user_id.as_deref()).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Bundle deleted successfully",
        }))
        .into_response(),
        Err(e) => bundle_error_response(e),
    }
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    match state.bundles.leaderboard(query.limit).await {
        Ok(bundles) => success_response(bundles),
        Err(e) => bundle_error_response(e),
    }
}
