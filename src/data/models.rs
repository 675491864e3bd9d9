//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Resolve a raw external identifier into a typed ID.
    ///
    /// Every handler that receives an entity reference goes through this
    /// before touching the database.
    ///
    /// # Errors
    /// `InvalidIdentifier` if the value is empty or not a valid ULID.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidIdentifier("identifier is missing".to_string()));
        }
        let ulid = ulid::Ulid::from_string(trimmed)
            .map_err(|_| AppError::InvalidIdentifier(trimmed.to_string()))?;
        Ok(Self(ulid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user; every user doubles as a channel.
///
/// `password_hash` and `refresh_token` are never projected into any view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Unique, stored lowercased
    pub username: String,
    /// Unique, stored lowercased
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Current refresh token; set at login, rotated on refresh, cleared at logout
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Video
// =============================================================================

/// An uploaded video
///
/// Media files live in object storage; the row holds URLs and keys.
/// `is_published` gates visibility in all public listing/detail queries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: String,
    pub owner_id: String,
    pub video_url: String,
    /// Storage key, needed for deletion
    pub video_key: String,
    pub thumbnail_url: String,
    pub thumbnail_key: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a video
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub owner_id: String,
    pub video_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Tweet
// =============================================================================

/// A short text post on a channel
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tweet {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Like
// =============================================================================

/// Target of a like: exactly one of video, comment, or tweet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Video(EntityId),
    Comment(EntityId),
    Tweet(EntityId),
}

impl LikeTarget {
    /// Column name the target binds to in the likes table
    pub fn column(&self) -> &'static str {
        match self {
            Self::Video(_) => "video_id",
            Self::Comment(_) => "comment_id",
            Self::Tweet(_) => "tweet_id",
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => id,
        }
    }
}

/// A like/dislike row
///
/// `liked` is the polarity: true = like, false = dislike.
/// Exactly one of the target columns is non-null (CHECK constraint).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub liked_by: String,
    pub liked: bool,
    pub video_id: Option<String>,
    pub comment_id: Option<String>,
    pub tweet_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, ordered set of videos
///
/// Membership lives in `playlist_videos` with a UNIQUE pair,
/// so adds are set-union and removes are set-difference.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Subscription
// =============================================================================

/// Directed edge: subscriber follows channel (a channel is a user)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}
