//! Database tests

use super::*;
use crate::error::AppError;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        display_name: format!("{username} Display"),
        avatar_url: "https://cdn.example.com/avatar.png".to_string(),
        cover_image_url: None,
        password_hash: "argon2-hash".to_string(),
        refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_video(owner_id: &str, title: &str) -> Video {
    let now = Utc::now();
    Video {
        id: EntityId::new().0,
        owner_id: owner_id.to_string(),
        video_url: "https://cdn.example.com/video.mp4".to_string(),
        video_key: "videos/video.mp4".to_string(),
        thumbnail_url: "https://cdn.example.com/thumb.png".to_string(),
        thumbnail_key: "thumbnails/thumb.png".to_string(),
        title: title.to_string(),
        description: "A test video".to_string(),
        duration: 42.5,
        views: 0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

fn test_comment(owner_id: &str, video_id: &str, content: &str) -> Comment {
    let now = Utc::now();
    Comment {
        id: EntityId::new().0,
        owner_id: owner_id.to_string(),
        video_id: video_id.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alice");
    db.insert_user(&user).await.unwrap();

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    let by_login = db.get_user_by_login("alice@example.com").await.unwrap();
    assert!(by_login.is_some());

    // Login lookup is case-folded
    let by_login = db.get_user_by_login("  ALICE  ").await.unwrap();
    assert!(by_login.is_some());

    assert!(db.get_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("bob")).await.unwrap();

    let mut dup = test_user("bob");
    dup.email = "other@example.com".to_string();
    let err = db.insert_user(&dup).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_refresh_token_lifecycle() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("carol");
    db.insert_user(&user).await.unwrap();

    db.set_refresh_token(&user.id, Some("token-1")).await.unwrap();
    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-1"));

    db.set_refresh_token(&user.id, None).await.unwrap();
    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn test_video_crud_and_visibility() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("dave");
    db.insert_user(&owner).await.unwrap();

    let mut video = test_video(&owner.id, "First upload");
    video.is_published = false;
    db.insert_video(&video).await.unwrap();

    // Unpublished videos are hidden from everyone but the owner
    assert!(db.get_visible_video(&video.id, None).await.unwrap().is_none());
    assert!(db
        .get_visible_video(&video.id, Some("someone-else"))
        .await
        .unwrap()
        .is_none());
    assert!(db
        .get_visible_video(&video.id, Some(&owner.id))
        .await
        .unwrap()
        .is_some());

    db.set_video_published(&video.id, true).await.unwrap();
    assert!(db.get_visible_video(&video.id, None).await.unwrap().is_some());

    let views = db.increment_video_views(&video.id).await.unwrap();
    assert_eq!(views, 1);
    let views = db.increment_video_views(&video.id).await.unwrap();
    assert_eq!(views, 2);

    let updated = db
        .update_video_metadata(
            &video.id,
            "Renamed",
            "New description",
            "https://cdn.example.com/thumb2.png",
            "thumbnails/thumb2.png",
        )
        .await
        .unwrap();
    assert!(updated);
    let stored = db.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.views, 2);
}

#[tokio::test]
async fn test_list_published_videos_filters_and_sorts() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("erin");
    db.insert_user(&owner).await.unwrap();

    let mut older = test_video(&owner.id, "Older");
    older.created_at = Utc::now() - chrono::Duration::hours(2);
    db.insert_video(&older).await.unwrap();

    let newer = test_video(&owner.id, "Newer");
    db.insert_video(&newer).await.unwrap();

    let mut draft = test_video(&owner.id, "Draft");
    draft.is_published = false;
    db.insert_video(&draft).await.unwrap();

    let listed = db.list_published_videos(None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "Newer");
    assert_eq!(listed[1].title, "Older");

    let by_owner = db.list_published_videos(Some(&owner.id)).await.unwrap();
    assert_eq!(by_owner.len(), 2);
    let by_other = db.list_published_videos(Some("other")).await.unwrap();
    assert!(by_other.is_empty());
}

#[tokio::test]
async fn test_video_delete_cascade() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("frank");
    let viewer = test_user("grace");
    db.insert_user(&owner).await.unwrap();
    db.insert_user(&viewer).await.unwrap();

    let video = test_video(&owner.id, "Doomed");
    db.insert_video(&video).await.unwrap();

    let comment = test_comment(&viewer.id, &video.id, "great stuff");
    db.insert_comment(&comment).await.unwrap();

    let video_target = LikeTarget::Video(EntityId(video.id.clone()));
    let comment_target = LikeTarget::Comment(EntityId(comment.id.clone()));
    db.insert_like(&viewer.id, true, &video_target).await.unwrap();
    db.insert_like(&owner.id, true, &comment_target).await.unwrap();

    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: viewer.id.clone(),
        name: "Favorites".to_string(),
        description: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();
    db.add_video_to_playlist(&playlist.id, &video.id).await.unwrap();
    db.append_watch_history(&viewer.id, &video.id, Utc::now())
        .await
        .unwrap();

    db.delete_video_cascade(&video.id).await.unwrap();

    assert!(db.get_video(&video.id).await.unwrap().is_none());
    assert_eq!(db.count_likes_for_video(&video.id).await.unwrap(), 0);
    assert_eq!(db.count_comments_for_video(&video.id).await.unwrap(), 0);
    assert!(db.get_likes_for(&comment_target).await.unwrap().is_empty());
    assert!(db
        .get_playlist_videos(&playlist.id, false)
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .get_watch_history_videos(&viewer.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_comment_pagination() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("heidi");
    db.insert_user(&owner).await.unwrap();
    let video = test_video(&owner.id, "Commented");
    db.insert_video(&video).await.unwrap();

    for i in 0..5 {
        let mut comment = test_comment(&owner.id, &video.id, &format!("comment {i}"));
        comment.created_at = Utc::now() - chrono::Duration::minutes(5 - i);
        db.insert_comment(&comment).await.unwrap();
    }

    let first_page = db.get_comments_page(&video.id, 2, 0).await.unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].content, "comment 4");

    let second_page = db.get_comments_page(&video.id, 2, 2).await.unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].content, "comment 2");

    let last_page = db.get_comments_page(&video.id, 2, 4).await.unwrap();
    assert_eq!(last_page.len(), 1);
}

#[tokio::test]
async fn test_comment_delete_removes_likes() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("ivan");
    db.insert_user(&owner).await.unwrap();
    let video = test_video(&owner.id, "V");
    db.insert_video(&video).await.unwrap();
    let comment = test_comment(&owner.id, &video.id, "to be removed");
    db.insert_comment(&comment).await.unwrap();

    let target = LikeTarget::Comment(EntityId(comment.id.clone()));
    db.insert_like(&owner.id, true, &target).await.unwrap();

    db.delete_comment_cascade(&comment.id).await.unwrap();
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert!(db.get_likes_for(&target).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_like_uniqueness_per_user_and_target() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("judy");
    db.insert_user(&owner).await.unwrap();
    let video = test_video(&owner.id, "Liked");
    db.insert_video(&video).await.unwrap();

    let target = LikeTarget::Video(EntityId(video.id.clone()));
    db.insert_like(&owner.id, true, &target).await.unwrap();
    let err = db.insert_like(&owner.id, false, &target).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Flipping polarity updates the one row
    let like = db.get_like_by_user(&owner.id, &target).await.unwrap().unwrap();
    db.set_like_polarity(&like.id, false).await.unwrap();
    let like = db.get_like_by_user(&owner.id, &target).await.unwrap().unwrap();
    assert!(!like.liked);

    db.delete_like(&like.id).await.unwrap();
    assert!(db.get_like_by_user(&owner.id, &target).await.unwrap().is_none());
}

#[tokio::test]
async fn test_liked_videos_only_positive_and_published() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("kate");
    db.insert_user(&owner).await.unwrap();

    let liked = test_video(&owner.id, "Liked");
    db.insert_video(&liked).await.unwrap();
    let disliked = test_video(&owner.id, "Disliked");
    db.insert_video(&disliked).await.unwrap();
    let mut draft = test_video(&owner.id, "Draft");
    draft.is_published = false;
    db.insert_video(&draft).await.unwrap();

    db.insert_like(&owner.id, true, &LikeTarget::Video(EntityId(liked.id.clone())))
        .await
        .unwrap();
    db.insert_like(
        &owner.id,
        false,
        &LikeTarget::Video(EntityId(disliked.id.clone())),
    )
    .await
    .unwrap();
    db.insert_like(&owner.id, true, &LikeTarget::Video(EntityId(draft.id.clone())))
        .await
        .unwrap();

    let videos = db.list_liked_videos(&owner.id).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "Liked");
}

#[tokio::test]
async fn test_playlist_membership_is_a_set() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("liam");
    db.insert_user(&owner).await.unwrap();
    let first = test_video(&owner.id, "First");
    let second = test_video(&owner.id, "Second");
    db.insert_video(&first).await.unwrap();
    db.insert_video(&second).await.unwrap();

    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: owner.id.clone(),
        name: "Mix".to_string(),
        description: "things".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();

    assert!(db.add_video_to_playlist(&playlist.id, &first.id).await.unwrap());
    assert!(db.add_video_to_playlist(&playlist.id, &second.id).await.unwrap());
    // Re-adding is a no-op
    assert!(!db.add_video_to_playlist(&playlist.id, &first.id).await.unwrap());

    let videos = db.get_playlist_videos(&playlist.id, false).await.unwrap();
    assert_eq!(videos.len(), 2);
    // Insertion order is preserved
    assert_eq!(videos[0].title, "First");
    assert_eq!(videos[1].title, "Second");

    let containing = db.get_playlist_ids_containing(&first.id).await.unwrap();
    assert!(containing.contains(&playlist.id));

    assert!(db
        .remove_video_from_playlist(&playlist.id, &first.id)
        .await
        .unwrap());
    // Removing a non-member is a no-op
    assert!(!db
        .remove_video_from_playlist(&playlist.id, &first.id)
        .await
        .unwrap());

    db.delete_playlist(&playlist.id).await.unwrap();
    assert!(db.get_playlist(&playlist.id).await.unwrap().is_none());
    assert!(db.get_playlist_ids_containing(&second.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_counts_and_lists() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("mallory");
    let fan_a = test_user("nina");
    let fan_b = test_user("oscar");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&fan_a).await.unwrap();
    db.insert_user(&fan_b).await.unwrap();

    db.insert_subscription(&fan_a.id, &channel.id).await.unwrap();
    db.insert_subscription(&fan_b.id, &channel.id).await.unwrap();

    let err = db.insert_subscription(&fan_a.id, &channel.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(db.count_subscribers(&channel.id).await.unwrap(), 2);
    assert_eq!(db.count_subscribed_to(&fan_a.id).await.unwrap(), 1);
    assert!(db.is_subscribed(&fan_a.id, &channel.id).await.unwrap());
    assert!(!db.is_subscribed(&channel.id, &fan_a.id).await.unwrap());

    let subscribers = db.get_channel_subscribers(&channel.id).await.unwrap();
    assert_eq!(subscribers.len(), 2);
    let channels = db.get_subscribed_channels(&fan_a.id).await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].username, "mallory");

    db.delete_subscription(&fan_a.id, &channel.id).await.unwrap();
    assert_eq!(db.count_subscribers(&channel.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_tweet_feed_follows_subscriptions() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("peggy");
    let other = test_user("quinn");
    let reader = test_user("rachel");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&other).await.unwrap();
    db.insert_user(&reader).await.unwrap();

    let now = Utc::now();
    let tweet = Tweet {
        id: EntityId::new().0,
        owner_id: channel.id.clone(),
        content: "hello from peggy".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_tweet(&tweet).await.unwrap();
    let unrelated = Tweet {
        id: EntityId::new().0,
        owner_id: other.id.clone(),
        content: "hello from quinn".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_tweet(&unrelated).await.unwrap();

    db.insert_subscription(&reader.id, &channel.id).await.unwrap();

    let feed = db.list_feed_tweets(&reader.id).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].content, "hello from peggy");

    let all = db.list_tweets(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let own = db.list_tweets(Some(&channel.id)).await.unwrap();
    assert_eq!(own.len(), 1);

    let target = LikeTarget::Tweet(EntityId(tweet.id.clone()));
    db.insert_like(&reader.id, true, &target).await.unwrap();
    db.delete_tweet_cascade(&tweet.id).await.unwrap();
    assert!(db.get_tweet(&tweet.id).await.unwrap().is_none());
    assert!(db.get_likes_for(&target).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_watch_history_order() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("sybil");
    db.insert_user(&user).await.unwrap();
    let first = test_video(&user.id, "Watched first");
    let second = test_video(&user.id, "Watched second");
    db.insert_video(&first).await.unwrap();
    db.insert_video(&second).await.unwrap();

    let now = Utc::now();
    db.append_watch_history(&user.id, &first.id, now - chrono::Duration::minutes(10))
        .await
        .unwrap();
    db.append_watch_history(&user.id, &second.id, now).await.unwrap();

    let history = db.get_watch_history_videos(&user.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].title, "Watched second");
    assert_eq!(history[1].title, "Watched first");
}

#[tokio::test]
async fn test_owner_profile_batch_fetch() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("trent");
    let b = test_user("ursula");
    db.insert_user(&a).await.unwrap();
    db.insert_user(&b).await.unwrap();

    let profiles = db
        .get_owner_profiles(&[a.id.clone(), b.id.clone()])
        .await
        .unwrap();
    assert_eq!(profiles.len(), 2);

    let empty = db.get_owner_profiles(&[]).await.unwrap();
    assert!(empty.is_empty());

    let single = db.get_owner_profile(&a.id).await.unwrap().unwrap();
    assert_eq!(single.username, "trent");
}
