use axum::{
    extract::{Path, State},
    Json,
};
use bigdecimal::BigDecimal;
use common_http_errors::{ApiError, ApiResult};
use common_money::within_minor_range;
use tracing::info;

use crate::guards::AdminContext;
use crate::models::{DeleteOutcome, InsertOutcome, MenuItem, MenuPatch, NewMenuItem, UpdateOutcome};
use crate::{parse_id, AppState};

fn validate_price(price: &BigDecimal) -> ApiResult<()> {
    if !within_minor_range(price) {
        return Err(ApiError::invalid("invalid_price", "price is out of range"));
    }
    if *price < BigDecimal::from(0) {
        return Err(ApiError::invalid("invalid_price", "price must not be negative"));
    }
    Ok(())
}

pub async fn list_menu(State(state): State<AppState>) -> ApiResult<Json<Vec<MenuItem>>> {
    let items = state
        .store
        .menu
        .list()
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(items))
}

/// Absent items come back as `null`, not 404.
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Option<MenuItem>>> {
    let id = parse_id(&raw_id)?;
    let item = state
        .store
        .menu
        .get(id)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(item))
}

pub async fn create_menu_item(
    admin: AdminContext,
    State(state): State<AppState>,
    Json(new_item): Json<NewMenuItem>,
) -> ApiResult<Json<InsertOutcome>> {
    if new_item.name.trim().is_empty() {
        return Err(ApiError::invalid("invalid_name", "name is required"));
    }
    validate_price(&new_item.price)?;

    let item = state
        .store
        .menu
        .insert(new_item)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    info!(menu_item_id = %item.id, by = %admin.user.email, "menu item created");
    Ok(Json(InsertOutcome::created(item.id)))
}

pub async fn update_menu_item(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(patch): Json<MenuPatch>,
) -> ApiResult<Json<UpdateOutcome>> {
    let id = parse_id(&raw_id)?;
    if let Some(price) = &patch.price {
        validate_price(price)?;
    }
    let outcome = state
        .store
        .menu
        .update(id, patch)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    info!(
        menu_item_id = %id,
        by = %admin.user.email,
        modified = outcome.modified_count,
        "menu item updated"
    );
    Ok(Json(outcome))
}

pub async fn delete_menu_item(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let id = parse_id(&raw_id)?;
    let deleted_count = state
        .store
        .menu
        .delete(id)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    info!(menu_item_id = %id, by = %admin.user.email, deleted_count, "menu item deleted");
    Ok(Json(DeleteOutcome { deleted_count }))
}
