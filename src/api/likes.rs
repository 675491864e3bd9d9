//! Like endpoints

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use super::envelope::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, LikeTarget};
use crate::error::AppError;
use crate::service::LikeService;

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    /// true for a like, false for a dislike.
    liked: bool,
}

// Returns a concrete type; `impl IntoResponse` would capture the
// caller_id borrow.
async fn toggle(
    state: AppState,
    caller_id: &str,
    target: LikeTarget,
    liked: bool,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let outcome = LikeService::new(state.db.clone())
        .toggle(caller_id, &target, liked)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "outcome": outcome }),
        "reaction toggled",
    ))
}

/// POST /api/v1/likes/toggle/video/:id
async fn toggle_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = LikeTarget::Video(EntityId::parse(&id)?);
    toggle(state, &claims.user_id, target, req.liked).await
}

/// POST /api/v1/likes/toggle/comment/:id
async fn toggle_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = LikeTarget::Comment(EntityId::parse(&id)?);
    toggle(state, &claims.user_id, target, req.liked).await
}

/// POST /api/v1/likes/toggle/tweet/:id
async fn toggle_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = LikeTarget::Tweet(EntityId::parse(&id)?);
    toggle(state, &claims.user_id, target, req.liked).await
}

/// GET /api/v1/likes/videos
async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let videos = LikeService::new(state.db.clone())
        .liked_videos(&claims.user_id)
        .await?;
    Ok(ApiResponse::ok(videos, "liked videos"))
}

pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/toggle/video/:id", post(toggle_video))
        .route("/toggle/comment/:id", post(toggle_comment))
        .route("/toggle/tweet/:id", post(toggle_tweet))
        .route("/videos", get(liked_videos))
}
