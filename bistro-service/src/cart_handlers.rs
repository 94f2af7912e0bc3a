use axum::{
    extract::{Path, Query, State},
    Json,
};
use common_http_errors::{ApiError, ApiResult};
use serde::Deserialize;

use crate::models::{CartEntry, DeleteOutcome, InsertOutcome, NewCartEntry};
use crate::{parse_id, AppState};

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub email: Option<String>,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(mut entry): Json<NewCartEntry>,
) -> ApiResult<Json<InsertOutcome>> {
    entry.email = entry.email.trim().to_owned();
    if entry.email.is_empty() {
        return Err(ApiError::invalid("invalid_email", "email is required"));
    }
    if entry.quantity < 1 {
        return Err(ApiError::invalid("invalid_quantity", "quantity must be at least 1"));
    }
    let created = state
        .store
        .carts
        .insert(entry)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(InsertOutcome::created(created.id)))
}

/// Without an `email` filter the listing is empty rather than every cart.
pub async fn list_cart(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> ApiResult<Json<Vec<CartEntry>>> {
    let Some(email) = query
        .email
        .map(|e| e.trim().to_owned())
        .filter(|e| !e.is_empty())
    else {
        return Ok(Json(Vec::new()));
    };
    let entries = state
        .store
        .carts
        .list_for(&email)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(entries))
}

pub async fn delete_cart_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let id = parse_id(&raw_id)?;
    let deleted_count = state
        .store
        .carts
        .delete(id)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(DeleteOutcome { deleted_count }))
}
