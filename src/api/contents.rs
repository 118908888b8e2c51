//! Catalog browsing and playback endpoints
//!
//! Listings and detail accept anonymous callers; stream and position routes
//! require a bearer token.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;
use crate::db::ContentFilter;
use crate::services::{
    ContentDetail, ContentListItem, Page, PageRequest, PlaybackState, StreamInfo,
};

use super::error::{ApiError, ApiResult, ErrorBody};
use super::extract::{ApiJson, ApiPath, ApiQuery, AuthUser, OptionalAuthUser};
use super::{ApiResponse, MessageResponse};

/// Raw paging parameters. Kept as strings so bad values fall back to defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Zero-based page number (default 0)
    pub page: Option<String>,
    /// Page size (default 10, at most 100)
    pub size: Option<String>,
    /// Case-insensitive title search
    pub q: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref(), self.size.as_deref())
    }

    fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaybackRequest {
    pub content_id: i64,
    pub current_position: i64,
    pub watch_duration: i64,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FinalPositionRequest {
    pub content_id: i64,
    pub final_position: i64,
    pub watch_duration: i64,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoryRequest {
    pub content_id: i64,
    pub last_position: i64,
    pub watch_duration: i64,
    #[serde(default)]
    pub is_completed: bool,
}

type PageResponse = Json<ApiResponse<Page<ContentListItem>>>;

/// Body and path must name the same content; positions cannot be negative.
fn validate_playback(
    path_id: i64,
    body_id: i64,
    position: i64,
    watch_duration: i64,
) -> ApiResult<()> {
    if body_id != path_id {
        return Err(ApiError::Validation {
            message: "Content ID mismatch".to_string(),
            details: Some(format!(
                "path content {} does not match body content_id {}",
                path_id, body_id
            )),
        });
    }
    if position < 0 || watch_duration < 0 {
        return Err(ApiError::validation(
            "Positions and durations must not be negative",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/contents",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of the catalog", body = ApiResponse<Page<ContentListItem>>)
    ),
    tag = "Contents"
)]
pub async fn list_contents(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<PageResponse> {
    let filter = match query.search_term() {
        Some(term) => ContentFilter::TitleContains(term),
        None => ContentFilter::All,
    };
    let page = state
        .catalog()
        .list(filter, query.page_request(), viewer.user_id())
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/contents/search",
    params(ListQuery),
    responses(
        (status = 200, description = "Titles matching the query", body = ApiResponse<Page<ContentListItem>>),
        (status = 400, description = "Missing or blank query", body = ErrorBody)
    ),
    tag = "Contents"
)]
pub async fn search_contents(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<PageResponse> {
    let term = query
        .search_term()
        .ok_or_else(|| ApiError::validation("Search query 'q' is required"))?;
    let page = state
        .catalog()
        .list(
            ContentFilter::TitleContains(term),
            query.page_request(),
            viewer.user_id(),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/contents/genre/{genre_id}",
    params(
        ("genre_id" = i64, Path, description = "Genre ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Titles in the genre; empty for an unknown genre", body = ApiResponse<Page<ContentListItem>>),
        (status = 400, description = "Genre ID is not a number", body = ErrorBody)
    ),
    tag = "Contents"
)]
pub async fn contents_by_genre(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    ApiPath(genre_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<PageResponse> {
    let page = state
        .catalog()
        .list(
            ContentFilter::Genre(genre_id),
            query.page_request(),
            viewer.user_id(),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/contents/{id}",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content with genres and the caller's state", body = ApiResponse<ContentDetail>),
        (status = 404, description = "Content not found", body = ErrorBody)
    ),
    tag = "Contents"
)]
pub async fn content_detail(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    ApiPath(content_id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<ContentDetail>>> {
    let detail = state
        .catalog()
        .detail(content_id, viewer.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Content not found"))?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    get,
    path = "/api/contents/{id}/stream",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Streaming URL and resume position", body = ApiResponse<StreamInfo>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Content not found", body = ErrorBody)
    ),
    tag = "Playback",
    security(("bearer_auth" = []))
)]
pub async fn stream_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(content_id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<StreamInfo>>> {
    let info = state
        .playback()
        .start_stream(user.id, content_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Content not found"))?;
    Ok(ApiResponse::ok(info))
}

#[utoipa::path(
    post,
    path = "/api/contents/{id}/playback",
    params(("id" = i64, Path, description = "Content ID")),
    request_body = PlaybackRequest,
    responses(
        (status = 200, description = "Position saved", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Body does not match the path or has negative values", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "Playback",
    security(("bearer_auth" = []))
)]
pub async fn update_playback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(content_id): ApiPath<i64>,
    ApiJson(body): ApiJson<PlaybackRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    validate_playback(content_id, body.content_id, body.current_position, body.watch_duration)?;

    state
        .playback()
        .save_position(
            user.id,
            content_id,
            PlaybackState {
                position: body.current_position,
                watch_duration: body.watch_duration,
                is_completed: body.is_completed,
            },
        )
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Playback position updated successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/contents/{id}/final-position",
    params(("id" = i64, Path, description = "Content ID")),
    request_body = FinalPositionRequest,
    responses(
        (status = 200, description = "Final position saved", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Body does not match the path or has negative values", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "Playback",
    security(("bearer_auth" = []))
)]
pub async fn save_final_position(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(content_id): ApiPath<i64>,
    ApiJson(body): ApiJson<FinalPositionRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    validate_playback(content_id, body.content_id, body.final_position, body.watch_duration)?;

    state
        .playback()
        .save_position(
            user.id,
            content_id,
            PlaybackState {
                position: body.final_position,
                watch_duration: body.watch_duration,
                is_completed: body.is_completed,
            },
        )
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Final position saved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/contents/{id}/history",
    params(("id" = i64, Path, description = "Content ID")),
    request_body = HistoryRequest,
    responses(
        (status = 200, description = "History entry written", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Body does not match the path or has negative values", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Content not found", body = ErrorBody)
    ),
    tag = "Playback",
    security(("bearer_auth" = []))
)]
pub async fn record_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(content_id): ApiPath<i64>,
    ApiJson(body): ApiJson<HistoryRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    validate_playback(content_id, body.content_id, body.last_position, body.watch_duration)?;

    let recorded = state
        .playback()
        .record_history(
            user.id,
            content_id,
            PlaybackState {
                position: body.last_position,
                watch_duration: body.watch_duration,
                is_completed: body.is_completed,
            },
        )
        .await?;
    if !recorded {
        return Err(ApiError::not_found("Content not found"));
    }
    Ok(ApiResponse::ok(MessageResponse::new(
        "Viewing history updated successfully",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contents))
        .route("/search", get(search_contents))
        .route("/genre/{genre_id}", get(contents_by_genre))
        .route("/{id}", get(content_detail))
        .route("/{id}/stream", get(stream_content))
        .route("/{id}/playback", post(update_playback))
        .route("/{id}/final-position", post(save_final_position))
        .route("/{id}/history", post(record_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validate_playback() {
        assert!(validate_playback(1, 1, 42, 42).is_ok());
        assert!(validate_playback(1, 1, 0, 0).is_ok());
        assert_matches!(validate_playback(1, 2, 42, 42), Err(ApiError::Validation { .. }));
        assert_matches!(validate_playback(1, 1, -1, 0), Err(ApiError::Validation { .. }));
        assert_matches!(validate_playback(1, 1, 0, -1), Err(ApiError::Validation { .. }));
    }

    #[test]
    fn test_list_query_search_term() {
        let query = ListQuery {
            q: Some("  orbit ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_term(), Some("orbit"));

        let blank = ListQuery {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.search_term(), None);
        assert_eq!(blank.page_request(), PageRequest::default());
    }
}
