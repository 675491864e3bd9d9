//! Authentication extractors
//!
//! `CurrentUser` rejects anonymous callers; `MaybeUser` serves the
//! viewer-relative handlers that also work anonymously.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::token::{TokenClaims, TokenKind, verify_token};
use crate::AppState;
use crate::error::AppError;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

fn authenticate_token(token: &str, state: &AppState) -> Result<TokenClaims, AppError> {
    verify_token(token, &state.config.auth.token_secret, TokenKind::Access)
}

/// Extractor for the current authenticated user.
///
/// Rejects with 401 when no valid access token is present.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub TokenClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<TokenClaims>().cloned() {
            return Ok(CurrentUser(claims));
        }

        let app_state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = authenticate_token(&token, &app_state)?;
        parts.extensions.insert(claims.clone());

        Ok(CurrentUser(claims))
    }
}

/// Optional viewer extractor.
///
/// Returns None instead of an error when unauthenticated, so viewer-relative
/// views can fall back to anonymous flags.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<TokenClaims>);

impl MaybeUser {
    pub fn viewer_id(&self) -> Option<&str> {
        self.0.as_ref().map(|claims| claims.user_id.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<TokenClaims>().cloned() {
            return Ok(MaybeUser(Some(claims)));
        }

        let app_state = AppState::from_ref(state);
        let claims = extract_token_from_headers(&parts.headers)
            .and_then(|token| authenticate_token(&token, &app_state).ok());

        if let Some(claims) = &claims {
            parts.extensions.insert(claims.clone());
        }

        Ok(MaybeUser(claims))
    }
}
