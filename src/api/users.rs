//! User endpoints
//!
//! Registration, login, token lifecycle, profile updates, channel profiles
//! and watch history.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use super::envelope::ApiResponse;
use super::form::FormData;
use crate::AppState;
use crate::auth::{ACCESS_TOKEN_COOKIE, CurrentUser, MaybeUser, REFRESH_TOKEN_COOKIE};
use crate::data::User;
use crate::error::AppError;
use crate::service::{TokenPair, UserService};

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        state.db.clone(),
        state.storage.clone(),
        state.config.auth.clone(),
    )
}

// Cookie lifetime is bounded by the token's own expiry claim.
fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn session_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(auth_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
        ))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_TOKEN_COOKIE, "")).path("/").build())
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    user: User,
    access_token: String,
    refresh_token: String,
}

impl SessionResponse {
    fn new(user: User, tokens: TokenPair) -> Self {
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// POST /api/v1/users/register (multipart)
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = FormData::read(multipart).await?;

    let user = user_service(&state)
        .register(
            form.text("username").unwrap_or_default(),
            form.text("email").unwrap_or_default(),
            form.text("display_name").unwrap_or_default(),
            form.text("password").unwrap_or_default(),
            form.require_file("avatar")?,
            form.file("cover_image"),
        )
        .await?;

    Ok(ApiResponse::created(user, "user registered"))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    /// Username or email.
    identifier: String,
    password: String,
}

/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Json(req): axum::Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, tokens) = user_service(&state).login(&req.identifier, &req.password).await?;

    let jar = session_cookies(jar, &tokens);
    Ok((
        jar,
        ApiResponse::ok(SessionResponse::new(user, tokens), "logged in"),
    ))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    user_service(&state).logout(&claims.user_id).await?;
    Ok((clear_session_cookies(jar), ApiResponse::ok((), "logged out")))
}

#[derive(Debug, Default, Deserialize)]
struct RefreshRequest {
    refresh_token: Option<String>,
}

/// POST /api/v1/users/refresh-token
///
/// The token comes from the JSON body or the refresh cookie.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<axum::Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let presented = body
        .and_then(|axum::Json(req)| req.refresh_token)
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_owned()))
        .ok_or(AppError::Unauthorized)?;

    let (user, tokens) = user_service(&state).refresh_tokens(&presented).await?;

    let jar = session_cookies(jar, &tokens);
    Ok((
        jar,
        ApiResponse::ok(SessionResponse::new(user, tokens), "tokens refreshed"),
    ))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(req): axum::Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    user_service(&state)
        .change_password(&claims.user_id, &req.old_password, &req.new_password)
        .await?;
    Ok(ApiResponse::ok((), "password changed"))
}

/// GET /api/v1/users/current-user
async fn current_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = user_service(&state).current_user(&claims.user_id).await?;
    Ok(ApiResponse::ok(user, "current user"))
}

#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    display_name: String,
    email: String,
}

/// PATCH /api/v1/users/update-account
async fn update_account(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(req): axum::Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_service(&state)
        .update_account(&claims.user_id, &req.display_name, &req.email)
        .await?;
    Ok(ApiResponse::ok(user, "account updated"))
}

/// PATCH /api/v1/users/avatar (multipart)
async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = FormData::read(multipart).await?;
    let user = user_service(&state)
        .update_avatar(&claims.user_id, form.require_file("avatar")?)
        .await?;
    Ok(ApiResponse::ok(user, "avatar updated"))
}

/// PATCH /api/v1/users/cover-image (multipart)
async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = FormData::read(multipart).await?;
    let user = user_service(&state)
        .update_cover_image(&claims.user_id, form.require_file("cover_image")?)
        .await?;
    Ok(ApiResponse::ok(user, "cover image updated"))
}

/// GET /api/v1/users/c/:username
async fn channel_profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = user_service(&state)
        .channel_profile(&username, viewer.viewer_id())
        .await?;
    Ok(ApiResponse::ok(profile, "channel profile"))
}

/// GET /api/v1/users/history
async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let videos = user_service(&state).watch_history(&claims.user_id).await?;
    Ok(ApiResponse::ok(videos, "watch history"))
}

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
}
