//! Profile and viewing history endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::db::UserRecord;
use crate::services::HistoryEntry;
use crate::services::auth::UpdateProfileInput;

use super::error::ErrorBody;
use super::extract::{ApiJson, AuthUser};
use super::{ApiResponse, ApiResult};

/// Public view of an account
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub current_password: String,
    pub new_password: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Caller's account", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Account no longer exists", body = ErrorBody)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let record = state.auth.profile(user.id).await?;
    Ok(ApiResponse::ok(record.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing current password or short new password", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Current password is wrong", body = ErrorBody)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let record = state
        .auth
        .update_profile(
            user.id,
            UpdateProfileInput {
                name: body.name,
                current_password: body.current_password,
                new_password: body.new_password,
            },
        )
        .await?;
    tracing::info!(user_id = user.id, "Profile updated");
    Ok(ApiResponse::ok(record.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/viewing-history",
    responses(
        (status = 200, description = "Viewing history, most recent first", body = ApiResponse<Vec<HistoryEntry>>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn viewing_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let entries = state.playback().history(user.id).await?;
    Ok(ApiResponse::ok(entries))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/viewing-history", get(viewing_history))
}
