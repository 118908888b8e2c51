//! Wishlist endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;
use crate::services::ContentListItem;

use super::error::{ApiError, ApiResult, ErrorBody};
use super::extract::{ApiPath, AuthUser};

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub is_wishlisted: bool,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/wishlists",
    responses(
        (status = 200, description = "Wishlisted titles, newest first", body = Vec<ContentListItem>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "Wishlists",
    security(("bearer_auth" = []))
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ContentListItem>>> {
    let items = state.wishlist().list(user.id).await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/wishlists/{content_id}",
    params(("content_id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "New wishlist state", body = ToggleResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Content not found", body = ErrorBody)
    ),
    tag = "Wishlists",
    security(("bearer_auth" = []))
)]
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(content_id): ApiPath<i64>,
) -> ApiResult<Json<ToggleResponse>> {
    let is_wishlisted = state
        .wishlist()
        .toggle(user.id, content_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Content not found"))?;

    let message = if is_wishlisted {
        "Content added to wishlist"
    } else {
        "Content removed from wishlist"
    };
    Ok(Json(ToggleResponse {
        is_wishlisted,
        message: message.to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/{content_id}", post(toggle_wishlist))
}
