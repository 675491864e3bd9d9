//! SQLite database operations
//!
//! All database access goes through this module.
//! The pool is created once at startup and injected through `AppState`;
//! no module-global connection exists.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashSet;
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Lightweight owner sub-profile projected into views.
///
/// Only public fields; credential and token columns are never selected here.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OwnerProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(err)
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Close the pool gracefully.
    ///
    /// Called on shutdown; in-flight queries are allowed to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, display_name, avatar_url, cover_image_url,
                password_hash, refresh_token, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username or email already in use"))?;

        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up by username or email, case-folded.
    pub async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let identifier = identifier.trim().to_lowercase();
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
                .bind(&identifier)
                .bind(&identifier)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Set, rotate, or clear (None) the stored refresh token.
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_user_account(
        &self,
        user_id: &str,
        display_name: &str,
        email: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET display_name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(display_name)
            .bind(email)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "email already in use"))?;
        Ok(())
    }

    pub async fn set_user_avatar(&self, user_id: &str, avatar_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar_url = ?, updated_at = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_user_cover_image(
        &self,
        user_id: &str,
        cover_image_url: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET cover_image_url = ?, updated_at = ? WHERE id = ?")
            .bind(cover_image_url)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Owner sub-profiles (relation fetcher)
    // =========================================================================

    pub async fn get_owner_profile(&self, user_id: &str) -> Result<Option<OwnerProfile>, AppError> {
        let profile = sqlx::query_as::<_, OwnerProfile>(
            "SELECT id, username, display_name, avatar_url FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Batch fetch of owner sub-profiles for a set of user IDs.
    pub async fn get_owner_profiles(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<OwnerProfile>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, username, display_name, avatar_url FROM users WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in user_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let profiles = builder
            .build_query_as::<OwnerProfile>()
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, owner_id, video_url, video_key, thumbnail_url, thumbnail_key,
                title, description, duration, views, is_published, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.owner_id)
        .bind(&video.video_url)
        .bind(&video.video_key)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_key)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    /// Get a video visible to `viewer`: published, or owned by the viewer.
    pub async fn get_visible_video(
        &self,
        id: &str,
        viewer_id: Option<&str>,
    ) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE id = ? AND (is_published = 1 OR owner_id = ?)",
        )
        .bind(id)
        .bind(viewer_id.unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    /// List published videos, newest first, optionally filtered by owner.
    pub async fn list_published_videos(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<Video>, AppError> {
        let videos = match owner_id {
            Some(owner_id) => {
                sqlx::query_as::<_, Video>(
                    r#"
                    SELECT * FROM videos
                    WHERE is_published = 1 AND owner_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Video>(
                    "SELECT * FROM videos WHERE is_published = 1 ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(videos)
    }

    pub async fn update_video_metadata(
        &self,
        id: &str,
        title: &str,
        description: &str,
        thumbnail_url: &str,
        thumbnail_key: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = ?, description = ?, thumbnail_url = ?, thumbnail_key = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail_url)
        .bind(thumbnail_key)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_video_published(&self, id: &str, published: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(published)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Increment the view counter and return the new value.
    pub async fn increment_video_views(&self, id: &str) -> Result<i64, AppError> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE videos SET views = views + 1, updated_at = ? WHERE id = ? RETURNING views",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(views)
    }

    /// Delete a video and everything referencing it.
    ///
    /// Cascade order inside one transaction: likes on the video, likes on its
    /// comments, the comments, playlist memberships, watch-history rows, the
    /// video row. Leaves no orphaned rows.
    pub async fn delete_video_cascade(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM likes WHERE comment_id IN (SELECT id FROM comments WHERE video_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM comments WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM watch_history WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, owner_id, video_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.owner_id)
        .bind(&comment.video_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    /// One page of a video's comments, newest first.
    pub async fn get_comments_page(
        &self,
        video_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE video_id = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn update_comment_content(&self, id: &str, content: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a comment and its likes in one transaction.
    pub async fn delete_comment_cascade(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE comment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Likes (relation fetcher + toggles)
    // =========================================================================

    /// All like rows for one target, both polarities.
    pub async fn get_likes_for(&self, target: &LikeTarget) -> Result<Vec<Like>, AppError> {
        let query = format!("SELECT * FROM likes WHERE {} = ?", target.column());
        let likes = sqlx::query_as::<_, Like>(&query)
            .bind(target.id().as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(likes)
    }

    /// Batch fetch of like rows for a set of comments (for the comment feed).
    pub async fn get_likes_for_comments(
        &self,
        comment_ids: &[String],
    ) -> Result<Vec<Like>, AppError> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM likes WHERE comment_id IN (");
        let mut separated = builder.separated(", ");
        for id in comment_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let likes = builder.build_query_as::<Like>().fetch_all(&self.pool).await?;
        Ok(likes)
    }

    /// Batch fetch of like rows for a set of tweets (for tweet feeds).
    pub async fn get_likes_for_tweets(&self, tweet_ids: &[String]) -> Result<Vec<Like>, AppError> {
        if tweet_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM likes WHERE tweet_id IN (");
        let mut separated = builder.separated(", ");
        for id in tweet_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let likes = builder.build_query_as::<Like>().fetch_all(&self.pool).await?;
        Ok(likes)
    }

    /// The viewer's existing like row for a target, if any.
    pub async fn get_like_by_user(
        &self,
        liked_by: &str,
        target: &LikeTarget,
    ) -> Result<Option<Like>, AppError> {
        let query = format!(
            "SELECT * FROM likes WHERE liked_by = ? AND {} = ?",
            target.column()
        );
        let like = sqlx::query_as::<_, Like>(&query)
            .bind(liked_by)
            .bind(target.id().as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(like)
    }

    pub async fn insert_like(
        &self,
        liked_by: &str,
        liked: bool,
        target: &LikeTarget,
    ) -> Result<(), AppError> {
        let (video_id, comment_id, tweet_id) = match target {
            LikeTarget::Video(id) => (Some(id.as_str()), None, None),
            LikeTarget::Comment(id) => (None, Some(id.as_str()), None),
            LikeTarget::Tweet(id) => (None, None, Some(id.as_str())),
        };

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO likes (id, liked_by, liked, video_id, comment_id, tweet_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(EntityId::new().0)
        .bind(liked_by)
        .bind(liked)
        .bind(video_id)
        .bind(comment_id)
        .bind(tweet_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "already reacted to this target"))?;
        Ok(())
    }

    pub async fn set_like_polarity(&self, like_id: &str, liked: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE likes SET liked = ?, updated_at = ? WHERE id = ?")
            .bind(liked)
            .bind(Utc::now())
            .bind(like_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_like(&self, like_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM likes WHERE id = ?")
            .bind(like_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Published videos the user liked (polarity true), newest like first.
    pub async fn list_liked_videos(&self, user_id: &str) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM videos v
            JOIN likes l ON l.video_id = v.id
            WHERE l.liked_by = ? AND l.liked = 1 AND v.is_published = 1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playlist.id)
        .bind(&playlist.owner_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(playlist)
    }

    pub async fn get_playlists_by_owner(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    pub async fn update_playlist(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE playlists SET name = ?, description = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(description)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Add a video to a playlist (set-union).
    ///
    /// # Returns
    /// `false` if the video was already a member (no-op).
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
            SELECT ?, ?, COALESCE(MAX(position), 0) + 1
            FROM playlist_videos WHERE playlist_id = ?
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Remove a video from a playlist (set-difference).
    ///
    /// Removing a non-member is a no-op success.
    pub async fn remove_video_from_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Member videos of a playlist in insertion order.
    pub async fn get_playlist_videos(
        &self,
        playlist_id: &str,
        published_only: bool,
    ) -> Result<Vec<Video>, AppError> {
        let query = if published_only {
            r#"
            SELECT v.* FROM videos v
            JOIN playlist_videos pv ON pv.video_id = v.id
            WHERE pv.playlist_id = ? AND v.is_published = 1
            ORDER BY pv.position
            "#
        } else {
            r#"
            SELECT v.* FROM videos v
            JOIN playlist_videos pv ON pv.video_id = v.id
            WHERE pv.playlist_id = ?
            ORDER BY pv.position
            "#
        };
        let videos = sqlx::query_as::<_, Video>(query)
            .bind(playlist_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    /// IDs of all playlists containing a video.
    pub async fn get_playlist_ids_containing(
        &self,
        video_id: &str,
    ) -> Result<HashSet<String>, AppError> {
        let rows = sqlx::query("SELECT playlist_id FROM playlist_videos WHERE video_id = ?")
            .bind(video_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("playlist_id"))
            .collect())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub async fn get_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    pub async fn insert_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "already subscribed"))?;
        Ok(())
    }

    pub async fn delete_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
            .bind(subscriber_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of subscribers a channel has.
    pub async fn count_subscribers(&self, channel_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Number of channels a user subscribes to.
    pub async fn count_subscribed_to(&self, subscriber_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?",
        )
        .bind(subscriber_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn is_subscribed(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Profiles of everyone subscribed to a channel.
    pub async fn get_channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<OwnerProfile>, AppError> {
        let profiles = sqlx::query_as::<_, OwnerProfile>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url
            FROM users u
            JOIN subscriptions s ON s.subscriber_id = u.id
            WHERE s.channel_id = ?
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    /// Profiles of every channel a user subscribes to.
    pub async fn get_subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<OwnerProfile>, AppError> {
        let profiles = sqlx::query_as::<_, OwnerProfile>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url
            FROM users u
            JOIN subscriptions s ON s.channel_id = u.id
            WHERE s.subscriber_id = ?
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tweets (id, owner_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tweet.id)
        .bind(&tweet.owner_id)
        .bind(&tweet.content)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tweet)
    }

    /// All tweets, newest first, optionally for one owner.
    pub async fn list_tweets(&self, owner_id: Option<&str>) -> Result<Vec<Tweet>, AppError> {
        let tweets = match owner_id {
            Some(owner_id) => {
                sqlx::query_as::<_, Tweet>(
                    "SELECT * FROM tweets WHERE owner_id = ? ORDER BY created_at DESC",
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Tweet>("SELECT * FROM tweets ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(tweets)
    }

    /// Tweets from channels the user subscribes to, newest first.
    pub async fn list_feed_tweets(&self, subscriber_id: &str) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            r#"
            SELECT t.* FROM tweets t
            WHERE t.owner_id IN (
                SELECT channel_id FROM subscriptions WHERE subscriber_id = ?
            )
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tweets)
    }

    pub async fn update_tweet_content(&self, id: &str, content: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tweets SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a tweet and its likes in one transaction.
    pub async fn delete_tweet_cascade(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE tweet_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Watch history
    // =========================================================================

    pub async fn append_watch_history(
        &self,
        user_id: &str,
        video_id: &str,
        watched_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO watch_history (id, user_id, video_id, watched_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind(video_id)
        .bind(watched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The user's watched videos, most recent first.
    pub async fn get_watch_history_videos(&self, user_id: &str) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM videos v
            JOIN watch_history wh ON wh.video_id = v.id
            WHERE wh.user_id = ?
            ORDER BY wh.watched_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Orphan checks (used by tests and integrity assertions)
    // =========================================================================

    pub async fn count_likes_for_video(&self, video_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_comments_for_video(&self, video_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
