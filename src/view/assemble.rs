//! View assemblers
//!
//! Pure merge steps. Every function takes already-fetched rows and produces
//! the serialized read shape; none of them touch the database. Credential
//! and token columns never reach these inputs, so they cannot leak into a
//! view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::flags;
use super::likes::LikeBuckets;
use crate::data::{Comment, OwnerProfile, Playlist, Tweet, User, Video};

// =============================================================================
// View shapes
// =============================================================================

/// Full single-video read shape.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerProfile,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub is_owner: bool,
}

/// Lightweight video shape used in listings, playlists and history.
#[derive(Debug, Clone, Serialize)]
pub struct VideoListItem {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: OwnerProfile,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_owner: bool,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub is_liked_by_video_owner: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentFeedPage {
    pub page: i64,
    pub limit: i64,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    /// Thumbnail of the first contained video; absent when empty.
    pub thumbnail_url: Option<String>,
    pub videos_count: i64,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub summary: PlaylistSummary,
    pub owner: OwnerProfile,
    pub videos: Vec<VideoListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TweetView {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: OwnerProfile,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub is_owner: bool,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// One of the viewer's playlists with a membership flag for a given video.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistMembership {
    pub id: String,
    pub name: String,
    pub is_video_present: bool,
}

// =============================================================================
// Assemblers
// =============================================================================

/// Index owner sub-profiles by user ID for list merges.
pub fn profile_map(profiles: Vec<OwnerProfile>) -> HashMap<String, OwnerProfile> {
    profiles.into_iter().map(|p| (p.id.clone(), p)).collect()
}

pub fn video_detail(
    video: Video,
    owner: OwnerProfile,
    buckets: &LikeBuckets,
    viewer_id: Option<&str>,
) -> VideoDetail {
    VideoDetail {
        is_owner: flags::is_owner(viewer_id, &video.owner_id),
        is_liked: flags::is_liked(viewer_id, buckets),
        is_disliked: flags::is_disliked(viewer_id, buckets),
        likes_count: buckets.likes_count(),
        dislikes_count: buckets.dislikes_count(),
        id: video.id,
        video_url: video.video_url,
        thumbnail_url: video.thumbnail_url,
        title: video.title,
        description: video.description,
        duration: video.duration,
        views: video.views,
        is_published: video.is_published,
        created_at: video.created_at,
        owner,
    }
}

pub fn video_list_item(video: Video, owner: OwnerProfile) -> VideoListItem {
    VideoListItem {
        id: video.id,
        video_url: video.video_url,
        thumbnail_url: video.thumbnail_url,
        title: video.title,
        description: video.description,
        duration: video.duration,
        views: video.views,
        created_at: video.created_at,
        owner,
    }
}

/// Merge videos with their owner sub-profiles, preserving input order.
///
/// Rows whose owner row is gone are dropped from the view.
pub fn video_list(
    videos: Vec<Video>,
    owners: &HashMap<String, OwnerProfile>,
) -> Vec<VideoListItem> {
    videos
        .into_iter()
        .filter_map(|video| {
            let owner = owners.get(&video.owner_id)?.clone();
            Some(video_list_item(video, owner))
        })
        .collect()
}

pub fn comment_view(
    comment: Comment,
    owner: OwnerProfile,
    buckets: &LikeBuckets,
    viewer_id: Option<&str>,
    video_owner_id: &str,
) -> CommentView {
    CommentView {
        is_owner: flags::is_owner(viewer_id, &comment.owner_id),
        is_liked: flags::is_liked(viewer_id, buckets),
        is_disliked: flags::is_disliked(viewer_id, buckets),
        is_liked_by_video_owner: buckets.has_liker(video_owner_id),
        likes_count: buckets.likes_count(),
        dislikes_count: buckets.dislikes_count(),
        id: comment.id,
        content: comment.content,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        owner,
    }
}

/// Summary derived only from the playlist row and its member videos.
pub fn playlist_summary(playlist: Playlist, member_videos: &[Video]) -> PlaylistSummary {
    PlaylistSummary {
        thumbnail_url: member_videos.first().map(|v| v.thumbnail_url.clone()),
        videos_count: member_videos.len() as i64,
        total_views: member_videos.iter().map(|v| v.views).sum(),
        id: playlist.id,
        name: playlist.name,
        description: playlist.description,
        owner_id: playlist.owner_id,
        created_at: playlist.created_at,
        updated_at: playlist.updated_at,
    }
}

pub fn playlist_detail(
    playlist: Playlist,
    owner: OwnerProfile,
    member_videos: Vec<Video>,
    video_owners: &HashMap<String, OwnerProfile>,
) -> PlaylistDetail {
    let summary = playlist_summary(playlist, &member_videos);
    PlaylistDetail {
        summary,
        owner,
        videos: video_list(member_videos, video_owners),
    }
}

pub fn channel_profile(
    user: User,
    subscribers_count: i64,
    subscribed_to_count: i64,
    is_subscribed: bool,
) -> ChannelProfile {
    ChannelProfile {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        email: user.email,
        avatar_url: user.avatar_url,
        cover_image_url: user.cover_image_url,
        subscribers_count,
        subscribed_to_count,
        is_subscribed,
    }
}

pub fn tweet_view(
    tweet: Tweet,
    owner: OwnerProfile,
    buckets: &LikeBuckets,
    viewer_id: Option<&str>,
) -> TweetView {
    TweetView {
        is_owner: flags::is_owner(viewer_id, &tweet.owner_id),
        is_liked: flags::is_liked(viewer_id, buckets),
        is_disliked: flags::is_disliked(viewer_id, buckets),
        likes_count: buckets.likes_count(),
        dislikes_count: buckets.dislikes_count(),
        id: tweet.id,
        content: tweet.content,
        created_at: tweet.created_at,
        updated_at: tweet.updated_at,
        owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn owner_profile(id: &str) -> OwnerProfile {
        OwnerProfile {
            id: id.to_string(),
            username: format!("user-{id}"),
            display_name: format!("User {id}"),
            avatar_url: "https://cdn.example.com/a.png".to_string(),
        }
    }

    fn video(id: &str, owner_id: &str, views: i64) -> Video {
        let now = Utc::now();
        Video {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            video_key: "videos/v.mp4".to_string(),
            thumbnail_url: format!("https://cdn.example.com/{id}.png"),
            thumbnail_key: format!("thumbnails/{id}.png"),
            title: format!("Video {id}"),
            description: String::new(),
            duration: 10.0,
            views,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn playlist(id: &str, owner_id: &str) -> Playlist {
        let now = Utc::now();
        Playlist {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: "Mix".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn video_detail_flags_for_owner_viewer() {
        let buckets = LikeBuckets {
            likers: vec!["o".to_string()],
            dislikers: vec!["x".to_string()],
        };
        let view = video_detail(video("v1", "o", 3), owner_profile("o"), &buckets, Some("o"));
        assert!(view.is_owner);
        assert!(view.is_liked);
        assert!(!view.is_disliked);
        assert_eq!(view.likes_count, 1);
        assert_eq!(view.dislikes_count, 1);
    }

    #[test]
    fn video_detail_anonymous_flags_false() {
        let buckets = LikeBuckets {
            likers: vec!["a".to_string()],
            dislikers: vec![],
        };
        let view = video_detail(video("v1", "o", 0), owner_profile("o"), &buckets, None);
        assert!(!view.is_owner);
        assert!(!view.is_liked);
        assert!(!view.is_disliked);
        assert_eq!(view.likes_count, 1);
    }

    #[test]
    fn comment_view_reports_video_owner_like() {
        let buckets = LikeBuckets {
            likers: vec!["video-owner".to_string()],
            dislikers: vec![],
        };
        let now = Utc::now();
        let comment = Comment {
            id: "c1".to_string(),
            owner_id: "commenter".to_string(),
            video_id: "v1".to_string(),
            content: "nice".to_string(),
            created_at: now,
            updated_at: now,
        };
        let view = comment_view(
            comment,
            owner_profile("commenter"),
            &buckets,
            Some("commenter"),
            "video-owner",
        );
        assert!(view.is_liked_by_video_owner);
        assert!(view.is_owner);
        assert!(!view.is_liked);
    }

    #[test]
    fn playlist_summary_derives_thumbnail_and_totals() {
        let videos = vec![video("a", "o", 5), video("b", "o", 7)];
        let summary = playlist_summary(playlist("p1", "o"), &videos);
        assert_eq!(
            summary.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(summary.videos_count, 2);
        assert_eq!(summary.total_views, 12);
    }

    #[test]
    fn empty_playlist_has_no_thumbnail() {
        let summary = playlist_summary(playlist("p1", "o"), &[]);
        assert!(summary.thumbnail_url.is_none());
        assert_eq!(summary.videos_count, 0);
        assert_eq!(summary.total_views, 0);
    }

    #[test]
    fn video_list_preserves_order_and_drops_orphans() {
        let owners = profile_map(vec![owner_profile("o")]);
        let videos = vec![video("a", "o", 0), video("b", "missing", 0), video("c", "o", 0)];
        let items = video_list(videos, &owners);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[1].id, "c");
    }

    #[test]
    fn channel_profile_carries_counts() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            username: "chan".to_string(),
            email: "chan@example.com".to_string(),
            display_name: "Chan".to_string(),
            avatar_url: "https://cdn.example.com/a.png".to_string(),
            cover_image_url: None,
            password_hash: "secret".to_string(),
            refresh_token: Some("token".to_string()),
            created_at: now,
            updated_at: now,
        };
        let profile = channel_profile(user, 10, 2, true);
        assert_eq!(profile.subscribers_count, 10);
        assert_eq!(profile.subscribed_to_count, 2);
        assert!(profile.is_subscribed);
        // Credential fields never serialize into the profile shape
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("refresh_token"));
    }
}
