//! OpenAPI document and Swagger UI
//!
//! The UI is served at `/docs/` and reads the JSON document from
//! [`OPENAPI_JSON_PATH`].

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;
use crate::db::GenreRecord;
use crate::services::{ContentDetail, ContentListItem, HistoryEntry, StreamInfo};

use super::error::ErrorBody;
use super::{auth, contents, genres, users, wishlists};

pub const OPENAPI_JSON_PATH: &str = "/api/swagger/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MiniFlix API",
        description = "Video catalog browsing, wishlists and playback tracking"
    ),
    paths(
        auth::register,
        auth::login,
        contents::list_contents,
        contents::search_contents,
        contents::contents_by_genre,
        contents::content_detail,
        contents::stream_content,
        contents::update_playback,
        contents::save_final_position,
        contents::record_history,
        genres::list_genres,
        users::get_profile,
        users::update_profile,
        users::viewing_history,
        wishlists::list_wishlist,
        wishlists::toggle_wishlist,
    ),
    components(schemas(
        ErrorBody,
        ContentListItem,
        ContentDetail,
        GenreRecord,
        StreamInfo,
        HistoryEntry
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Contents", description = "Catalog browsing"),
        (name = "Playback", description = "Streams and playback position"),
        (name = "Genres", description = "Genre listing"),
        (name = "Users", description = "Profile and viewing history"),
        (name = "Wishlists", description = "Save-for-later list")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected routes
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI plus the JSON document
pub fn router() -> Router<AppState> {
    SwaggerUi::new("/docs")
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_document_covers_every_api_route() {
        let doc: Value = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();

        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/contents",
            "/api/contents/search",
            "/api/contents/genre/{genre_id}",
            "/api/contents/{id}",
            "/api/contents/{id}/stream",
            "/api/contents/{id}/playback",
            "/api/contents/{id}/final-position",
            "/api/contents/{id}/history",
            "/api/genres",
            "/api/users/profile",
            "/api/users/viewing-history",
            "/api/wishlists",
            "/api/wishlists/{content_id}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }

        assert!(paths["/api/users/profile"]["put"].is_object());
        assert!(doc["components"]["schemas"]["ContentListItem"].is_object());
    }

    #[test]
    fn test_protected_routes_declare_bearer_auth() {
        let doc: Value = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(
            doc["components"]["securitySchemes"]["bearer_auth"]["scheme"],
            "bearer"
        );

        let stream = &doc["paths"]["/api/contents/{id}/stream"]["get"];
        assert!(stream["security"][0]["bearer_auth"].is_array());

        let listing = &doc["paths"]["/api/contents"]["get"];
        assert!(listing.get("security").is_none());
    }
}
