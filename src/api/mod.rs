//! REST API route definitions
//!
//! Everything except health checks and static assets is nested under `/api`.

pub mod auth;
pub mod contents;
pub mod docs;
pub mod error;
pub mod extract;
pub mod genres;
pub mod health;
pub mod users;
pub mod wishlists;

use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub use error::{ApiError, ApiResult};

/// `{"success": true, "data": ...}` envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Routes mounted at `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/contents", contents::router())
        .nest("/genres", genres::router())
        .nest("/users", users::router())
        .nest("/wishlists", wishlists::router())
}
