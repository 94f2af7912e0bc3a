use axum::{extract::State, Json};
use common_http_errors::{ApiError, ApiResult};

use crate::models::Review;
use crate::AppState;

pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<Review>>> {
    let reviews = state
        .store
        .reviews
        .list()
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(reviews))
}
