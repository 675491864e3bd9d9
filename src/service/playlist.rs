//! Playlist service
//!
//! Playlists are video sets with insertion order. Summaries derive their
//! thumbnail and totals from the member videos at read time.

use std::sync::Arc;

use crate::data::{Database, EntityId, Playlist};
use crate::error::AppError;
use crate::view::{self, PlaylistDetail, PlaylistMembership, PlaylistSummary};

/// Playlist service
pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        let now = chrono::Utc::now();
        let playlist = Playlist {
            id: EntityId::new().0,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_playlist(&playlist).await?;
        Ok(playlist)
    }

    /// A user's playlists as summaries (thumbnail, counts, total views).
    pub async fn user_playlists(&self, user_id: &str) -> Result<Vec<PlaylistSummary>, AppError> {
        let playlists = self.db.get_playlists_by_owner(user_id).await?;
        let mut summaries = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let member_videos = self.db.get_playlist_videos(&playlist.id, false).await?;
            summaries.push(view::playlist_summary(playlist, &member_videos));
        }
        Ok(summaries)
    }

    /// Playlist detail; the member list is filtered to published videos.
    pub async fn detail(&self, playlist_id: &EntityId) -> Result<PlaylistDetail, AppError> {
        let playlist = self
            .db
            .get_playlist(playlist_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;

        let (owner, member_videos) = tokio::try_join!(
            self.db.get_owner_profile(&playlist.owner_id),
            self.db.get_playlist_videos(&playlist.id, true),
        )?;
        let owner = owner.ok_or(AppError::NotFound)?;

        let owner_ids: Vec<String> = member_videos.iter().map(|v| v.owner_id.clone()).collect();
        let video_owners = view::profile_map(self.db.get_owner_profiles(&owner_ids).await?);

        Ok(view::playlist_detail(playlist, owner, member_videos, &video_owners))
    }

    /// Add a video to a playlist; re-adding is a no-op.
    pub async fn add_video(
        &self,
        playlist_id: &EntityId,
        video_id: &EntityId,
        caller_id: &str,
    ) -> Result<bool, AppError> {
        let playlist = self.owned_playlist(playlist_id, caller_id).await?;
        self.db
            .get_video(video_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;

        self.db.add_video_to_playlist(&playlist.id, video_id.as_str()).await
    }

    /// Remove a video; removing a non-member succeeds without effect.
    pub async fn remove_video(
        &self,
        playlist_id: &EntityId,
        video_id: &EntityId,
        caller_id: &str,
    ) -> Result<bool, AppError> {
        let playlist = self.owned_playlist(playlist_id, caller_id).await?;
        self.db
            .remove_video_from_playlist(&playlist.id, video_id.as_str())
            .await
    }

    pub async fn update(
        &self,
        playlist_id: &EntityId,
        caller_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        let playlist = self.owned_playlist(playlist_id, caller_id).await?;
        self.db
            .update_playlist(&playlist.id, name, description.trim())
            .await?;
        self.db
            .get_playlist(&playlist.id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, playlist_id: &EntityId, caller_id: &str) -> Result<(), AppError> {
        let playlist = self.owned_playlist(playlist_id, caller_id).await?;
        self.db.delete_playlist(&playlist.id).await
    }

    /// The caller's playlists with a membership flag for one video.
    pub async fn membership_for_video(
        &self,
        caller_id: &str,
        video_id: &EntityId,
    ) -> Result<Vec<PlaylistMembership>, AppError> {
        let (playlists, containing) = tokio::try_join!(
            self.db.get_playlists_by_owner(caller_id),
            self.db.get_playlist_ids_containing(video_id.as_str()),
        )?;

        Ok(playlists
            .into_iter()
            .map(|playlist| PlaylistMembership {
                is_video_present: containing.contains(&playlist.id),
                id: playlist.id,
                name: playlist.name,
            })
            .collect())
    }

    async fn owned_playlist(
        &self,
        playlist_id: &EntityId,
        caller_id: &str,
    ) -> Result<Playlist, AppError> {
        let playlist = self
            .db
            .get_playlist(playlist_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        if playlist.owner_id != caller_id {
            return Err(AppError::Forbidden);
        }
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{User, Video};
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-playlist.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_user(db: &Database, username: &str) -> User {
        let now = chrono::Utc::now();
        let user = User {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: username.to_string(),
            avatar_url: "https://media.test.example.com/avatars/x.png".to_string(),
            cover_image_url: None,
            password_hash: "hash".to_string(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        db.insert_user(&user).await.unwrap();
        user
    }

    async fn seed_video(db: &Database, owner_id: &str, title: &str, views: i64, published: bool) -> Video {
        let now = chrono::Utc::now();
        let video = Video {
            id: EntityId::new().0,
            owner_id: owner_id.to_string(),
            video_url: "https://media.test.example.com/videos/v.mp4".to_string(),
            video_key: "videos/v.mp4".to_string(),
            thumbnail_url: format!("https://media.test.example.com/thumbnails/{title}.png"),
            thumbnail_key: format!("thumbnails/{title}.png"),
            title: title.to_string(),
            description: String::new(),
            duration: 1.0,
            views,
            is_published: published,
            created_at: now,
            updated_at: now,
        };
        db.insert_video(&video).await.unwrap();
        video
    }

    #[tokio::test]
    async fn summaries_derive_thumbnail_and_totals() {
        let (db, _temp_dir) = create_test_db().await;
        let user = seed_user(&db, "alice").await;
        let first = seed_video(&db, &user.id, "first", 3, true).await;
        let second = seed_video(&db, &user.id, "second", 4, true).await;
        let service = PlaylistService::new(db);

        let playlist = service.create(&user.id, "Mix", "stuff").await.unwrap();
        let playlist_id = EntityId(playlist.id.clone());
        service
            .add_video(&playlist_id, &EntityId(first.id.clone()), &user.id)
            .await
            .unwrap();
        service
            .add_video(&playlist_id, &EntityId(second.id.clone()), &user.id)
            .await
            .unwrap();

        let summaries = service.user_playlists(&user.id).await.unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.videos_count, 2);
        assert_eq!(summary.total_views, 7);
        assert_eq!(summary.thumbnail_url, Some(first.thumbnail_url.clone()));
    }

    #[tokio::test]
    async fn detail_filters_members_to_published() {
        let (db, _temp_dir) = create_test_db().await;
        let user = seed_user(&db, "bob").await;
        let published = seed_video(&db, &user.id, "pub", 0, true).await;
        let draft = seed_video(&db, &user.id, "draft", 0, false).await;
        let service = PlaylistService::new(db);

        let playlist = service.create(&user.id, "Mix", "").await.unwrap();
        let playlist_id = EntityId(playlist.id.clone());
        service
            .add_video(&playlist_id, &EntityId(published.id.clone()), &user.id)
            .await
            .unwrap();
        service
            .add_video(&playlist_id, &EntityId(draft.id.clone()), &user.id)
            .await
            .unwrap();

        let detail = service.detail(&playlist_id).await.unwrap();
        assert_eq!(detail.videos.len(), 1);
        assert_eq!(detail.videos[0].id, published.id);
        assert_eq!(detail.owner.username, "bob");
    }

    #[tokio::test]
    async fn membership_flags_per_video() {
        let (db, _temp_dir) = create_test_db().await;
        let user = seed_user(&db, "carol").await;
        let video = seed_video(&db, &user.id, "v", 0, true).await;
        let service = PlaylistService::new(db);

        let with_video = service.create(&user.id, "Has it", "").await.unwrap();
        let without = service.create(&user.id, "Empty", "").await.unwrap();
        service
            .add_video(&EntityId(with_video.id.clone()), &EntityId(video.id.clone()), &user.id)
            .await
            .unwrap();

        let memberships = service
            .membership_for_video(&user.id, &EntityId(video.id.clone()))
            .await
            .unwrap();
        assert_eq!(memberships.len(), 2);
        let by_id = |id: &str| memberships.iter().find(|m| m.id == id).unwrap();
        assert!(by_id(&with_video.id).is_video_present);
        assert!(!by_id(&without.id).is_video_present);
    }

    #[tokio::test]
    async fn mutations_require_playlist_ownership() {
        let (db, _temp_dir) = create_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let intruder = seed_user(&db, "intruder").await;
        let video = seed_video(&db, &owner.id, "v", 0, true).await;
        let service = PlaylistService::new(db);

        let playlist = service.create(&owner.id, "Mine", "").await.unwrap();
        let playlist_id = EntityId(playlist.id.clone());

        let err = service
            .add_video(&playlist_id, &EntityId(video.id.clone()), &intruder.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = service
            .update(&playlist_id, &intruder.id, "Hijacked", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = service.delete(&playlist_id, &intruder.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
