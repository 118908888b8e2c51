//! Request extractors that reject with [`ApiError`]
//!
//! `AuthUser` requires a valid bearer token; `OptionalAuthUser` accepts
//! anonymous callers and treats a bad token as no token.

use std::convert::Infallible;

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::AppState;
use crate::services::AuthenticatedUser;

use super::error::ApiError;

/// `axum::Json` with rejections rendered as `ApiError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections rendered as `ApiError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with rejections rendered as `ApiError`
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive and the header must have exactly two parts.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("Authorization header is missing")?
        .to_str()
        .map_err(|_| "Authorization header is not valid text")?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err("Authorization header format must be Bearer {token}"),
    }
}

/// Authenticated caller. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .map_err(|reason| ApiError::unauthorized("Authentication required", reason))?;
        let user = state.auth.verify_token(token)?;
        Ok(AuthUser(user))
    }
}

/// Caller identity if a valid bearer token was sent
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthenticatedUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = extract_token(&parts.headers)
            .ok()
            .and_then(|token| state.auth.verify_token(token).ok());
        Ok(OptionalAuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(&headers("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(extract_token(&headers("bearer abc.def")), Ok("abc.def"));
        assert_eq!(extract_token(&headers("BEARER abc.def")), Ok("abc.def"));

        assert!(extract_token(&HeaderMap::new()).is_err());
        assert!(extract_token(&headers("abc.def")).is_err());
        assert!(extract_token(&headers("Basic abc.def")).is_err());
        assert!(extract_token(&headers("Bearer abc def")).is_err());
        assert!(extract_token(&headers("Bearer ")).is_err());
    }
}
