use axum::{extract::State, Json};
use common_http_errors::{ApiError, ApiResult};

use crate::analytics::{AdminStats, OrderCatalogRow};
use crate::guards::AdminContext;
use crate::AppState;

pub async fn admin_stats(
    _admin: AdminContext,
    State(state): State<AppState>,
) -> ApiResult<Json<AdminStats>> {
    let stats = state
        .analytics
        .summary()
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(stats))
}

pub async fn order_stats(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderCatalogRow>>> {
    let rows = state
        .analytics
        .order_catalog()
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(rows))
}
