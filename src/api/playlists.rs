//! Playlist endpoints

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
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::PlaylistService;

#[derive(Debug, Deserialize)]
struct PlaylistRequest {
    name: String,
    #[serde(default)]
    description: String,
}

/// POST /api/v1/playlists
async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(req): axum::Json<PlaylistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .create(&claims.user_id, &req.name, &req.description)
        .await?;
    Ok(ApiResponse::created(playlist, "playlist created"))
}

/// GET /api/v1/playlists/user/:user_id
async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = EntityId::parse(&user_id)?;
    let playlists = PlaylistService::new(state.db.clone())
        .user_playlists(user_id.as_str())
        .await?;
    Ok(ApiResponse::ok(playlists, "playlists"))
}

/// GET /api/v1/playlists/:id
async fn playlist_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let detail = PlaylistService::new(state.db.clone()).detail(&id).await?;
    Ok(ApiResponse::ok(detail, "playlist"))
}

/// PATCH /api/v1/playlists/:id (owner only)
async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<PlaylistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let playlist = PlaylistService::new(state.db.clone())
        .update(&id, &claims.user_id, &req.name, &req.description)
        .await?;
    Ok(ApiResponse::ok(playlist, "playlist updated"))
}

/// DELETE /api/v1/playlists/:id (owner only)
async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    PlaylistService::new(state.db.clone())
        .delete(&id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok((), "playlist deleted"))
}

/// POST /api/v1/playlists/:playlist_id/videos/:video_id (owner only)
async fn add_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = EntityId::parse(&playlist_id)?;
    let video_id = EntityId::parse(&video_id)?;
    let added = PlaylistService::new(state.db.clone())
        .add_video(&playlist_id, &video_id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "added": added }),
        "video added to playlist",
    ))
}

/// DELETE /api/v1/playlists/:playlist_id/videos/:video_id (owner only)
async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = EntityId::parse(&playlist_id)?;
    let video_id = EntityId::parse(&video_id)?;
    let removed = PlaylistService::new(state.db.clone())
        .remove_video(&playlist_id, &video_id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "removed": removed }),
        "video removed from playlist",
    ))
}

/// GET /api/v1/playlists/video-save/:video_id
///
/// The caller's playlists, each flagged with whether the video is present.
async fn video_save_list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = EntityId::parse(&video_id)?;
    let memberships = PlaylistService::new(state.db.clone())
        .membership_for_video(&claims.user_id, &video_id)
        .await?;
    Ok(ApiResponse::ok(memberships, "playlist membership"))
}

pub fn playlists_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:user_id", get(user_playlists))
        .route(
            "/:id",
            get(playlist_detail)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route(
            "/:playlist_id/videos/:video_id",
            post(add_video).delete(remove_video),
        )
        .route("/video-save/:video_id", get(video_save_list))
}
