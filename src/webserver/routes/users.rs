use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    errors::UserError,
    logger::{self, LogTag},
    users::{UserLookup, UserUpdate},
    webserver::{
        state::AppState,
        utils::{error_response, success_response},
    },
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(get_user).post(sync_user))
}

fn user_error_response(error: UserError) -> Response {
    match error {
        UserError::MissingUserId | UserError::MissingLookupKey => {
            error_response(StatusCode::BAD_REQUEST, &error.to_string())
        }
        UserError::NotFound => error_response(StatusCode::NOT_FOUND, &error.to_string()),
        UserError::Store(e) => {
            logger::error(LogTag::Webserver, &format!("User request failed: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn sync_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    match state.users.sync(update).await {
        Ok(profile) => success_response(profile),
        Err(e) => user_error_response(e),
    }
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserLookup>,
) -> Response {
    match state.users.find(query).await {
        Ok(profile) => success_response(profile),
        Err(e) => user_error_response(e),
    }
}
