//! Subscription service
//!
//! Subscriptions are unique (subscriber, channel) edges toggled on and off.

use std::sync::Arc;

use crate::data::{Database, EntityId, OwnerProfile};
use crate::error::AppError;

/// Subscription service
pub struct SubscriptionService {
    db: Arc<Database>,
}

impl SubscriptionService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Toggle the caller's subscription to a channel.
    ///
    /// # Returns
    /// `true` when the caller is subscribed after the call.
    pub async fn toggle(&self, caller_id: &str, channel_id: &EntityId) -> Result<bool, AppError> {
        if caller_id == channel_id.as_str() {
            return Err(AppError::Validation(
                "cannot subscribe to your own channel".to_string(),
            ));
        }
        self.db
            .get_user(channel_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;

        match self.db.get_subscription(caller_id, channel_id.as_str()).await? {
            Some(_) => {
                self.db.delete_subscription(caller_id, channel_id.as_str()).await?;
                Ok(false)
            }
            None => {
                self.db.insert_subscription(caller_id, channel_id.as_str()).await?;
                Ok(true)
            }
        }
    }

    /// Everyone subscribed to a channel.
    pub async fn channel_subscribers(
        &self,
        channel_id: &EntityId,
    ) -> Result<Vec<OwnerProfile>, AppError> {
        self.db
            .get_user(channel_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.get_channel_subscribers(channel_id.as_str()).await
    }

    /// Every channel a user subscribes to.
    pub async fn subscribed_channels(
        &self,
        user_id: &EntityId,
    ) -> Result<Vec<OwnerProfile>, AppError> {
        self.db
            .get_user(user_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.get_subscribed_channels(user_id.as_str()).await
    }
}
