//! Video service
//!
//! Handles video publishing, listing, detail assembly, metadata updates,
//! deletion with cascade, publish toggling and view recording.

use std::sync::Arc;

use super::Upload;
use crate::data::{Database, EntityId, LikeTarget, Video};
use crate::error::AppError;
use crate::storage::MediaStorage;
use crate::view::{self, LikeBuckets, VideoDetail, VideoListItem};

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl VideoService {
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publish a new video.
    ///
    /// Both files are uploaded concurrently before the database write.
    /// If the insert fails the uploaded objects are removed best-effort.
    pub async fn publish(
        &self,
        owner_id: &str,
        title: &str,
        description: &str,
        duration: Option<f64>,
        video_file: Upload,
        thumbnail: Upload,
    ) -> Result<Video, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if video_file.data.is_empty() || thumbnail.data.is_empty() {
            return Err(AppError::Validation(
                "video and thumbnail files are required".to_string(),
            ));
        }

        let id = EntityId::new().0;
        let ((video_key, video_url), (thumbnail_key, thumbnail_url)) = tokio::try_join!(
            self.storage
                .upload_video(&id, video_file.data, &video_file.content_type),
            self.storage
                .upload_thumbnail(&id, thumbnail.data, &thumbnail.content_type),
        )?;

        let now = chrono::Utc::now();
        let video = Video {
            id,
            owner_id: owner_id.to_string(),
            video_url,
            video_key: video_key.clone(),
            thumbnail_url,
            thumbnail_key: thumbnail_key.clone(),
            title: title.to_string(),
            description: description.trim().to_string(),
            duration: duration.unwrap_or(0.0),
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_video(&video).await {
            self.storage.delete_best_effort(&video_key).await;
            self.storage.delete_best_effort(&thumbnail_key).await;
            return Err(e);
        }

        tracing::info!(video_id = %video.id, "Video published");
        Ok(video)
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Published videos, newest first, optionally one channel's.
    pub async fn list(&self, owner_id: Option<&str>) -> Result<Vec<VideoListItem>, AppError> {
        let videos = self.db.list_published_videos(owner_id).await?;
        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = view::profile_map(self.db.get_owner_profiles(&owner_ids).await?);
        Ok(view::video_list(videos, &owners))
    }

    /// Full video detail with owner, like buckets and viewer flags.
    ///
    /// Unpublished videos resolve only for their owner.
    pub async fn detail(
        &self,
        video_id: &EntityId,
        viewer_id: Option<&str>,
    ) -> Result<VideoDetail, AppError> {
        let video = self
            .db
            .get_visible_video(video_id.as_str(), viewer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let target = LikeTarget::Video(EntityId(video.id.clone()));
        let (owner, like_rows) = tokio::try_join!(
            self.db.get_owner_profile(&video.owner_id),
            self.db.get_likes_for(&target),
        )?;
        let owner = owner.ok_or(AppError::NotFound)?;
        let buckets = LikeBuckets::from_rows(&like_rows);

        Ok(view::video_detail(video, owner, &buckets, viewer_id))
    }

    /// Record one view: bump the counter and append to the viewer's watch
    /// history when a viewer exists.
    pub async fn record_view(
        &self,
        video_id: &EntityId,
        viewer_id: Option<&str>,
    ) -> Result<i64, AppError> {
        self.db
            .get_visible_video(video_id.as_str(), viewer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let views = self.db.increment_video_views(video_id.as_str()).await?;
        if let Some(viewer_id) = viewer_id {
            self.db
                .append_watch_history(viewer_id, video_id.as_str(), chrono::Utc::now())
                .await?;
        }
        Ok(views)
    }

    // =========================================================================
    // Mutations (owner only)
    // =========================================================================

    pub async fn update_metadata(
        &self,
        video_id: &EntityId,
        caller_id: &str,
        title: &str,
        description: &str,
        thumbnail: Option<Upload>,
    ) -> Result<Video, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }

        let video = self.owned_video(video_id, caller_id).await?;

        let (thumbnail_url, thumbnail_key) = match thumbnail {
            Some(upload) if !upload.data.is_empty() => {
                let (key, url) = self
                    .storage
                    .upload_thumbnail(&EntityId::new().0, upload.data, &upload.content_type)
                    .await?;
                self.storage.delete_best_effort(&video.thumbnail_key).await;
                (url, key)
            }
            _ => (video.thumbnail_url.clone(), video.thumbnail_key.clone()),
        };

        self.db
            .update_video_metadata(
                &video.id,
                title,
                description.trim(),
                &thumbnail_url,
                &thumbnail_key,
            )
            .await?;
        self.db
            .get_video(&video.id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Delete a video, its stored objects, and every row referencing it.
    pub async fn delete(&self, video_id: &EntityId, caller_id: &str) -> Result<(), AppError> {
        let video = self.owned_video(video_id, caller_id).await?;

        self.db.delete_video_cascade(&video.id).await?;
        self.storage.delete_best_effort(&video.video_key).await;
        self.storage.delete_best_effort(&video.thumbnail_key).await;

        tracing::info!(video_id = %video.id, "Video deleted");
        Ok(())
    }

    /// Flip the published flag; returns the new state.
    pub async fn toggle_publish(
        &self,
        video_id: &EntityId,
        caller_id: &str,
    ) -> Result<bool, AppError> {
        let video = self.owned_video(video_id, caller_id).await?;
        let next = !video.is_published;
        self.db.set_video_published(&video.id, next).await?;
        Ok(next)
    }

    async fn owned_video(&self, video_id: &EntityId, caller_id: &str) -> Result<Video, AppError> {
        let video = self
            .db
            .get_video(video_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        if video.owner_id != caller_id {
            return Err(AppError::Forbidden);
        }
        Ok(video)
    }
}
