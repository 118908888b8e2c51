//! Application state and HTTP router construction.
//!
//! Used by [main] and by the integration tests to build the Axum app.

use std::any::Any as PanicPayload;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::services::{AuthConfig, AuthService, CatalogService, PlaybackService, WishlistService};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        let auth = AuthService::new(db.clone(), AuthConfig::from_config(&config));
        Self { config, db, auth }
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.clone())
    }

    pub fn playback(&self) -> PlaybackService {
        PlaybackService::new(self.db.clone())
    }

    pub fn wishlist(&self) -> WishlistService {
        WishlistService::new(self.db.clone())
    }
}

const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::CONTENT_SECURITY_POLICY, "default-src 'self'"),
];

/// CORS from the configured origins. `*` or no origins allows any origin
/// without credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed).allow_credentials(true)
}

/// Turn a handler panic into the regular JSON 500 body
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// Build the full Axum router: health, docs, /api, static assets, layers, and fallback.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    let config = state.config.clone();

    let routes = Router::new()
        .merge(api::health::router())
        .merge(api::docs::router())
        .nest("/api", api::router())
        .nest_service("/assets/videos", ServeDir::new(&config.media_path))
        .nest_service("/assets/thumbnails", ServeDir::new(&config.thumbnail_path))
        .fallback(api::error::route_not_found);

    with_middleware(routes, &config.cors_allow_origins).with_state(state)
}

/// Wrap `router` in the shared middleware stack.
///
/// Outermost first: trace, CORS, security headers, compression, panic catcher.
/// Panic responses therefore still carry CORS and security headers.
fn with_middleware<S>(router: Router<S>, cors_origins: &[String]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new());

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(cors_origins)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use std::convert::Infallible;
    use tower::{Layer, ServiceExt};

    async fn failing_handler() -> &'static str {
        panic!("handler failure")
    }

    #[test]
    fn test_cors_layer_accepts_every_origin_shape() {
        // tower-http panics when wrapping a service with credentials plus wildcards
        let inner = tower::service_fn(|_req: axum::http::Request<axum::body::Body>| async {
            Ok::<_, Infallible>(Response::new(axum::body::Body::empty()))
        });

        for origins in [
            vec![],
            vec!["*".to_string()],
            vec!["http://localhost:3000".to_string(), "bad\norigin".to_string()],
        ] {
            let _ = cors_layer(&origins).layer(inner.clone());
        }
    }

    #[tokio::test]
    async fn test_panic_response_keeps_cors_and_security_headers() {
        let router: Router = Router::new().route("/fail", get(failing_handler));
        let app = with_middleware(router, &["http://localhost:3000".to_string()]);

        let response = app
            .oneshot(
                Request::get("/fail")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}
