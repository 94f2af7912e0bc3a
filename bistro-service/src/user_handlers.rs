use axum::{
    extract::{Path, State},
    Json,
};
use common_auth::{ensure_self, AuthContext};
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use tracing::info;

use crate::guards::AdminContext;
use crate::models::{DeleteOutcome, InsertOutcome, NewUser, Registration, UpdateOutcome, User};
use crate::{parse_id, AppState};

const ALREADY_EXISTS: &str = "user already exists";

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub admin: bool,
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(mut new_user): Json<NewUser>,
) -> ApiResult<Json<InsertOutcome>> {
    new_user.email = new_user.email.trim().to_owned();
    if new_user.email.is_empty() {
        return Err(ApiError::invalid("invalid_email", "email is required"));
    }

    let registration = state
        .store
        .users
        .insert_if_absent(new_user)
        .await
        .map_err(|err| ApiError::internal(err, None))?;

    Ok(Json(match registration {
        Registration::Created(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            InsertOutcome::created(user.id)
        }
        Registration::Existing(_) => InsertOutcome {
            inserted_id: None,
            message: Some(ALREADY_EXISTS),
        },
    }))
}

pub async fn list_users(
    _admin: AdminContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .store
        .users
        .list()
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(users))
}

/// Reports whether the caller's own stored role is admin.
pub async fn admin_status(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<AdminStatus>> {
    ensure_self(&auth, Some(email.as_str()))?;
    let user = state
        .store
        .users
        .find_by_email(&email)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(AdminStatus {
        admin: user.map(|u| u.role.is_admin()).unwrap_or(false),
    }))
}

pub async fn promote_user(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<UpdateOutcome>> {
    let id = parse_id(&raw_id)?;
    let outcome = state
        .store
        .users
        .promote(id)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    info!(
        target_user = %id,
        by = %admin.user.email,
        modified = outcome.modified_count,
        "user promoted to admin"
    );
    Ok(Json(outcome))
}

pub async fn delete_user(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let id = parse_id(&raw_id)?;
    let deleted_count = state
        .store
        .users
        .delete(id)
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    info!(target_user = %id, by = %admin.user.email, deleted_count, "user deleted");
    Ok(Json(DeleteOutcome { deleted_count }))
}
