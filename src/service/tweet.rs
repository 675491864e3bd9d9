//! Tweet service
//!
//! Short channel posts with like reactions. Feeds come in three flavors:
//! everything, one channel's posts, and posts from subscribed channels.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{Database, EntityId, Like, Tweet};
use crate::error::AppError;
use crate::view::{self, LikeBuckets, TweetView};

/// Tweet service
pub struct TweetService {
    db: Arc<Database>,
}

impl TweetService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, owner_id: &str, content: &str) -> Result<Tweet, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        let now = chrono::Utc::now();
        let tweet = Tweet {
            id: EntityId::new().0,
            owner_id: owner_id.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_tweet(&tweet).await?;
        Ok(tweet)
    }

    /// All tweets, newest first.
    pub async fn all(&self, viewer_id: Option<&str>) -> Result<Vec<TweetView>, AppError> {
        let tweets = self.db.list_tweets(None).await?;
        self.assemble(tweets, viewer_id).await
    }

    /// One user's tweets, newest first.
    pub async fn user_tweets(
        &self,
        user_id: &EntityId,
        viewer_id: Option<&str>,
    ) -> Result<Vec<TweetView>, AppError> {
        self.db
            .get_user(user_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        let tweets = self.db.list_tweets(Some(user_id.as_str())).await?;
        self.assemble(tweets, viewer_id).await
    }

    /// Tweets from channels the caller subscribes to, newest first.
    pub async fn subscription_feed(&self, caller_id: &str) -> Result<Vec<TweetView>, AppError> {
        let tweets = self.db.list_feed_tweets(caller_id).await?;
        self.assemble(tweets, Some(caller_id)).await
    }

    pub async fn update(
        &self,
        tweet_id: &EntityId,
        caller_id: &str,
        content: &str,
    ) -> Result<Tweet, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        let tweet = self.owned_tweet(tweet_id, caller_id).await?;
        self.db.update_tweet_content(&tweet.id, content).await?;
        self.db.get_tweet(&tweet.id).await?.ok_or(AppError::NotFound)
    }

    /// Delete a tweet and its likes.
    pub async fn delete(&self, tweet_id: &EntityId, caller_id: &str) -> Result<(), AppError> {
        let tweet = self.owned_tweet(tweet_id, caller_id).await?;
        self.db.delete_tweet_cascade(&tweet.id).await
    }

    async fn assemble(
        &self,
        tweets: Vec<Tweet>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<TweetView>, AppError> {
        let tweet_ids: Vec<String> = tweets.iter().map(|t| t.id.clone()).collect();
        let owner_ids: Vec<String> = tweets.iter().map(|t| t.owner_id.clone()).collect();
        let (like_rows, owner_profiles) = tokio::try_join!(
            self.db.get_likes_for_tweets(&tweet_ids),
            self.db.get_owner_profiles(&owner_ids),
        )?;

        let likes_by_tweet = group_likes_by_tweet(like_rows);
        let owners = view::profile_map(owner_profiles);
        let empty = LikeBuckets::default();

        Ok(tweets
            .into_iter()
            .filter_map(|tweet| {
                let owner = owners.get(&tweet.owner_id)?.clone();
                let buckets = likes_by_tweet.get(&tweet.id).unwrap_or(&empty);
                Some(view::tweet_view(tweet, owner, buckets, viewer_id))
            })
            .collect())
    }

    async fn owned_tweet(&self, tweet_id: &EntityId, caller_id: &str) -> Result<Tweet, AppError> {
        let tweet = self
            .db
            .get_tweet(tweet_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        if tweet.owner_id != caller_id {
            return Err(AppError::Forbidden);
        }
        Ok(tweet)
    }
}

fn group_likes_by_tweet(rows: Vec<Like>) -> HashMap<String, LikeBuckets> {
    let mut by_tweet: HashMap<String, Vec<Like>> = HashMap::new();
    for row in rows {
        if let Some(tweet_id) = row.tweet_id.clone() {
            by_tweet.entry(tweet_id).or_default().push(row);
        }
    }
    by_tweet
        .into_iter()
        .map(|(tweet_id, rows)| (tweet_id, LikeBuckets::from_rows(&rows)))
        .collect()
}
