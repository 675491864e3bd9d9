//! Comment service
//!
//! Handles the paginated comment feed plus add, update and delete.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{Comment, Database, EntityId, Like};
use crate::error::AppError;
use crate::view::{self, CommentFeedPage, LikeBuckets};

const DEFAULT_PAGE_LIMIT: i64 = 10;
const MAX_PAGE_LIMIT: i64 = 100;

/// Comment service
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// One page of a video's comments, newest first.
    ///
    /// `page` starts at 1; `limit` is clamped to 1..=100 with a default of
    /// 10. Each comment carries its owner profile, like buckets and viewer
    /// flags, plus whether the video's owner liked it.
    pub async fn feed(
        &self,
        video_id: &EntityId,
        viewer_id: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<CommentFeedPage, AppError> {
        let video = self
            .db
            .get_visible_video(video_id.as_str(), viewer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        // Saturate: an absurd page number yields an empty page, not overflow.
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let comments = self
            .db
            .get_comments_page(&video.id, limit, offset)
            .await?;

        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let owner_ids: Vec<String> = comments.iter().map(|c| c.owner_id.clone()).collect();
        let (like_rows, owner_profiles) = tokio::try_join!(
            self.db.get_likes_for_comments(&comment_ids),
            self.db.get_owner_profiles(&owner_ids),
        )?;

        let likes_by_comment = group_likes_by_comment(like_rows);
        let owners = view::profile_map(owner_profiles);

        let empty = LikeBuckets::default();
        let views = comments
            .into_iter()
            .filter_map(|comment| {
                let owner = owners.get(&comment.owner_id)?.clone();
                let buckets = likes_by_comment.get(&comment.id).unwrap_or(&empty);
                Some(view::comment_view(
                    comment,
                    owner,
                    buckets,
                    viewer_id,
                    &video.owner_id,
                ))
            })
            .collect();

        Ok(CommentFeedPage {
            page,
            limit,
            comments: views,
        })
    }

    pub async fn add(
        &self,
        video_id: &EntityId,
        owner_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        self.db
            .get_visible_video(video_id.as_str(), Some(owner_id))
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now();
        let comment = Comment {
            id: EntityId::new().0,
            owner_id: owner_id.to_string(),
            video_id: video_id.as_str().to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_comment(&comment).await?;
        Ok(comment)
    }

    pub async fn update(
        &self,
        comment_id: &EntityId,
        caller_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        let comment = self.owned_comment(comment_id, caller_id).await?;
        self.db.update_comment_content(&comment.id, content).await?;
        self.db
            .get_comment(&comment.id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Delete a comment and its likes.
    pub async fn delete(&self, comment_id: &EntityId, caller_id: &str) -> Result<(), AppError> {
        let comment = self.owned_comment(comment_id, caller_id).await?;
        self.db.delete_comment_cascade(&comment.id).await
    }

    async fn owned_comment(
        &self,
        comment_id: &EntityId,
        caller_id: &str,
    ) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(comment_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        if comment.owner_id != caller_id {
            return Err(AppError::Forbidden);
        }
        Ok(comment)
    }
}

fn group_likes_by_comment(rows: Vec<Like>) -> HashMap<String, LikeBuckets> {
    let mut by_comment: HashMap<String, Vec<Like>> = HashMap::new();
    for row in rows {
        if let Some(comment_id) = row.comment_id.clone() {
            by_comment.entry(comment_id).or_default().push(row);
        }
    }
    by_comment
        .into_iter()
        .map(|(comment_id, rows)| (comment_id, LikeBuckets::from_rows(&rows)))
        .collect()
}
