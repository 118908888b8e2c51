//! Genre listing

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;
use crate::db::GenreRecord;

use super::{ApiResponse, ApiResult};

#[utoipa::path(
    get,
    path = "/api/genres",
    responses(
        (status = 200, description = "All genres ordered by name", body = ApiResponse<Vec<GenreRecord>>)
    ),
    tag = "Genres"
)]
pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<GenreRecord>>>> {
    let genres = state.catalog().genres().await?;
    Ok(ApiResponse::ok(genres))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_genres))
}
