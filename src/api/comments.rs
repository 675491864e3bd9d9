//! Comment endpoints

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;

use super::envelope::ApiResponse;
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::CommentService;

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /api/v1/comments/video/:video_id
async fn comment_feed(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = EntityId::parse(&video_id)?;
    let page = CommentService::new(state.db.clone())
        .feed(&video_id, viewer.viewer_id(), params.page, params.limit)
        .await?;
    Ok(ApiResponse::ok(page, "comments"))
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

/// POST /api/v1/comments/video/:video_id
async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
    axum::Json(req): axum::Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = EntityId::parse(&video_id)?;
    let comment = CommentService::new(state.db.clone())
        .add(&video_id, &claims.user_id, &req.content)
        .await?;
    Ok(ApiResponse::created(comment, "comment added"))
}

/// PATCH /api/v1/comments/:id (owner only)
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let comment = CommentService::new(state.db.clone())
        .update(&id, &claims.user_id, &req.content)
        .await?;
    Ok(ApiResponse::ok(comment, "comment updated"))
}

/// DELETE /api/v1/comments/:id (owner only)
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    CommentService::new(state.db.clone())
        .delete(&id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok((), "comment deleted"))
}

pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/video/:video_id", get(comment_feed).post(add_comment))
        .route("/:id", patch(update_comment).delete(delete_comment))
}
