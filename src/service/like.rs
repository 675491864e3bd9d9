//! Like service
//!
//! One reaction row per (user, target). Toggling with the same polarity
//! removes the row, the opposite polarity flips it in place, and no row
//! creates one.

use std::sync::Arc;

use serde::Serialize;

use crate::data::{Database, LikeTarget};
use crate::error::AppError;
use crate::view::{self, VideoListItem};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Flipped,
    Removed,
}

/// Like service
pub struct LikeService {
    db: Arc<Database>,
}

impl LikeService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Toggle the caller's reaction on a target.
    ///
    /// # Errors
    /// `NotFound` when the target does not exist.
    pub async fn toggle(
        &self,
        caller_id: &str,
        target: &LikeTarget,
        liked: bool,
    ) -> Result<ToggleOutcome, AppError> {
        self.ensure_target_exists(caller_id, target).await?;

        match self.db.get_like_by_user(caller_id, target).await? {
            None => {
                self.db.insert_like(caller_id, liked, target).await?;
                Ok(ToggleOutcome::Added)
            }
            Some(existing) if existing.liked == liked => {
                self.db.delete_like(&existing.id).await?;
                Ok(ToggleOutcome::Removed)
            }
            Some(existing) => {
                self.db.set_like_polarity(&existing.id, liked).await?;
                Ok(ToggleOutcome::Flipped)
            }
        }
    }

    /// Published videos the caller liked, with owner profiles.
    pub async fn liked_videos(&self, caller_id: &str) -> Result<Vec<VideoListItem>, AppError> {
        let videos = self.db.list_liked_videos(caller_id).await?;
        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = view::profile_map(self.db.get_owner_profiles(&owner_ids).await?);
        Ok(view::video_list(videos, &owners))
    }

    async fn ensure_target_exists(
        &self,
        caller_id: &str,
        target: &LikeTarget,
    ) -> Result<(), AppError> {
        let exists = match target {
            LikeTarget::Video(id) => self
                .db
                .get_visible_video(id.as_str(), Some(caller_id))
                .await?
                .is_some(),
            LikeTarget::Comment(id) => self.db.get_comment(id.as_str()).await?.is_some(),
            LikeTarget::Tweet(id) => self.db.get_tweet(id.as_str()).await?.is_some(),
        };
        if exists { Ok(()) } else { Err(AppError::NotFound) }
    }
}
