use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    errors::LookupError,
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

/// Cap on `/tokens/all` results
const MAX_LIST_SIZE: usize = 100;

/// Search terms shorter than this are ignored
const MIN_SEARCH_LEN: usize = 2;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens", get(get_token))
        .route("/tokens/all", get(list_tokens))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenListQuery {
    pub search: Option<String>,
}

/// Token details, from the database when fresh, Birdeye otherwise
async fn get_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    let address = match query.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => address.to_string(),
        _ => {
            return error_response(StatusCode::BAD_REQUEST, "Address parameter is required")
        }
    };

    match state.lookup.lookup(&address).await {
        Ok(result) => Json(json!({
            "success": true,
            "data": result.token,
            "source": result.source,
        }))
        .into_response(),
        Err(e @ LookupError::InvalidAddress(_)) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(LookupError::NotFound(message)) => error_response(StatusCode::NOT_FOUND, &message),
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Error fetching token details for {}: {}", address, e),
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Stored tokens by price, optionally filtered by name/symbol
async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenListQuery>,
) -> Response {
    let mut tokens = match state.token_store.list_all().await {
        Ok(tokens) => tokens,
        Err(e) => {
            logger::error(LogTag::Webserver, &format!("Error fetching tokens: {}", e));
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let search = query
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| s.chars().count() >= MIN_SEARCH_LEN);

    if let Some(term) = &search {
        tokens.retain(|t| {
            t.name.to_lowercase().contains(term) || t.symbol.to_lowercase().contains(term)
        });
    }

    tokens.sort_by(|a, b| {
        b.price
            .partial_cmp(&a.price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    tokens.truncate(MAX_LIST_SIZE);

    if tokens.is_empty() {
        let message = match &search {
            Some(term) => format!("No tokens found matching \"{}\"", term),
            None => "No tokens found in the database".to_string(),
        };
        return Json(json!({ "success": true, "data": [], "message": message })).into_response();
    }

    Json(json!({
        "success": true,
        "count": tokens.len(),
        "data": tokens,
    }))
    .into_response()
}
