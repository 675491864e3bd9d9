//! Video endpoints

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;

use super::envelope::ApiResponse;
use super::form::FormData;
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::VideoService;

fn video_service(state: &AppState) -> VideoService {
    VideoService::new(state.db.clone(), state.storage.clone())
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    /// Restrict the listing to one channel.
    owner_id: Option<String>,
}

/// GET /api/v1/videos
async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = params
        .owner_id
        .as_deref()
        .map(EntityId::parse)
        .transpose()?;

    let videos = video_service(&state)
        .list(owner_id.as_ref().map(EntityId::as_str))
        .await?;
    Ok(ApiResponse::ok(videos, "videos"))
}

/// POST /api/v1/videos (multipart)
async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = FormData::read(multipart).await?;

    let duration = form
        .text("duration")
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| AppError::Validation("duration must be a number".to_string()))
        })
        .transpose()?;

    let video = video_service(&state)
        .publish(
            &claims.user_id,
            form.require_text("title")?,
            form.text("description").unwrap_or_default(),
            duration,
            form.require_file("video_file")?,
            form.require_file("thumbnail")?,
        )
        .await?;

    Ok(ApiResponse::created(video, "video published"))
}

/// GET /api/v1/videos/:id
async fn get_video(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let detail = video_service(&state).detail(&id, viewer.viewer_id()).await?;
    Ok(ApiResponse::ok(detail, "video"))
}

/// PATCH /api/v1/videos/:id (multipart, owner only)
async fn update_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let form = FormData::read(multipart).await?;

    let video = video_service(&state)
        .update_metadata(
            &id,
            &claims.user_id,
            form.require_text("title")?,
            form.text("description").unwrap_or_default(),
            form.file("thumbnail"),
        )
        .await?;
    Ok(ApiResponse::ok(video, "video updated"))
}

/// DELETE /api/v1/videos/:id (owner only)
async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    video_service(&state).delete(&id, &claims.user_id).await?;
    Ok(ApiResponse::ok((), "video deleted"))
}

/// PATCH /api/v1/videos/:id/toggle-publish (owner only)
async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let is_published = video_service(&state)
        .toggle_publish(&id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "is_published": is_published }),
        "publish state toggled",
    ))
}

/// POST /api/v1/videos/:id/view
async fn record_view(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let views = video_service(&state)
        .record_view(&id, viewer.viewer_id())
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "views": views }),
        "view recorded",
    ))
}

pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/:id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/:id/toggle-publish", patch(toggle_publish))
        .route("/:id/view", post(record_view))
}
