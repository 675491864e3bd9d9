//! User service
//!
//! Handles registration, credentials, token lifecycle, profile updates,
//! channel profiles and watch history.

use std::sync::Arc;

use serde::Serialize;

use super::Upload;
use crate::auth::{self, TokenClaims, TokenKind};
use crate::config::AuthConfig;
use crate::data::{Database, EntityId, User};
use crate::error::AppError;
use crate::storage::MediaStorage;
use crate::view::{self, ChannelProfile, VideoListItem};

/// Freshly issued access + refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User service
pub struct UserService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    auth: AuthConfig,
}

impl UserService {
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>, auth: AuthConfig) -> Self {
        Self { db, storage, auth }
    }

    // =========================================================================
    // Registration and credentials
    // =========================================================================

    /// Register a new user.
    ///
    /// Uploads the avatar (and optional cover) before the database write.
    /// If the insert fails the uploaded objects are removed best-effort.
    ///
    /// # Errors
    /// `ValidationFields` when required fields are blank, `Conflict` when the
    /// username or email is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        display_name: &str,
        password: &str,
        avatar: Upload,
        cover: Option<Upload>,
    ) -> Result<User, AppError> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();
        let display_name = display_name.trim();

        let mut missing = Vec::new();
        for (name, value) in [
            ("username", username.as_str()),
            ("email", email.as_str()),
            ("display_name", display_name),
            ("password", password),
        ] {
            if value.is_empty() {
                missing.push(format!("{name} must not be empty"));
            }
        }
        if avatar.data.is_empty() {
            missing.push("avatar file is required".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::ValidationFields(missing));
        }

        let id = EntityId::new().0;
        let password_hash = auth::hash_password(password)?;

        let (avatar_key, avatar_url) = self
            .storage
            .upload_avatar(&id, avatar.data, &avatar.content_type)
            .await?;
        let mut cover_key = None;
        let mut cover_image_url = None;
        if let Some(cover) = cover {
            let (key, url) = self
                .storage
                .upload_cover(&id, cover.data, &cover.content_type)
                .await?;
            cover_key = Some(key);
            cover_image_url = Some(url);
        }

        let now = chrono::Utc::now();
        let user = User {
            id,
            username,
            email,
            display_name: display_name.to_string(),
            avatar_url,
            cover_image_url,
            password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_user(&user).await {
            self.storage.delete_best_effort(&avatar_key).await;
            if let Some(key) = &cover_key {
                self.storage.delete_best_effort(key).await;
            }
            return Err(e);
        }

        tracing::info!(username = %user.username, "User registered");
        Ok(user)
    }

    /// Log in with username or email.
    ///
    /// Issues a token pair and stores the refresh token on the user row.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "identifier and password are required".to_string(),
            ));
        }

        let user = self
            .db
            .get_user_by_login(identifier)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&user).await?;
        tracing::info!(username = %user.username, "User logged in");
        Ok((user, tokens))
    }

    /// Clear the stored refresh token so it can no longer be redeemed.
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        self.db.set_refresh_token(user_id, None).await
    }

    /// Redeem a refresh token for a new pair, rotating the stored token.
    ///
    /// The presented token must match the one stored on the user row;
    /// rotation invalidates the previous token.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        let claims = auth::verify_token(refresh_token, &self.auth.token_secret, TokenKind::Refresh)?;

        let user = self
            .db
            .get_user(&claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::Validation("new password must not be empty".to_string()));
        }

        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        if !auth::verify_password(old_password, &user.password_hash)? {
            return Err(AppError::Validation("old password is incorrect".to_string()));
        }

        let hash = auth::hash_password(new_password)?;
        self.db.set_password_hash(user_id, &hash).await
    }

    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        let access = auth::create_token(
            &TokenClaims::access(user, self.auth.access_token_ttl),
            &self.auth.token_secret,
        )?;
        let refresh = auth::create_token(
            &TokenClaims::refresh(user, self.auth.refresh_token_ttl),
            &self.auth.token_secret,
        )?;
        self.db.set_refresh_token(&user.id, Some(&refresh)).await?;

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn current_user(&self, user_id: &str) -> Result<User, AppError> {
        self.db.get_user(user_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        display_name: &str,
        email: &str,
    ) -> Result<User, AppError> {
        let display_name = display_name.trim();
        let email = email.trim().to_lowercase();
        if display_name.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "display_name and email must not be empty".to_string(),
            ));
        }

        self.db.update_user_account(user_id, display_name, &email).await?;
        self.current_user(user_id).await
    }

    /// Upload a new avatar and swap it in; the old object is removed
    /// best-effort after the row update.
    pub async fn update_avatar(&self, user_id: &str, avatar: Upload) -> Result<User, AppError> {
        if avatar.data.is_empty() {
            return Err(AppError::Validation("avatar file is required".to_string()));
        }
        let user = self.current_user(user_id).await?;

        let (_key, url) = self
            .storage
            .upload_avatar(&EntityId::new().0, avatar.data, &avatar.content_type)
            .await?;
        self.db.set_user_avatar(user_id, &url).await?;

        if let Some(old_key) = self.storage.key_from_url(&user.avatar_url) {
            self.storage.delete_best_effort(&old_key).await;
        }
        self.current_user(user_id).await
    }

    pub async fn update_cover_image(&self, user_id: &str, cover: Upload) -> Result<User, AppError> {
        if cover.data.is_empty() {
            return Err(AppError::Validation("cover image file is required".to_string()));
        }
        let user = self.current_user(user_id).await?;

        let (_key, url) = self
            .storage
            .upload_cover(&EntityId::new().0, cover.data, &cover.content_type)
            .await?;
        self.db.set_user_cover_image(user_id, &url).await?;

        if let Some(old_url) = &user.cover_image_url {
            if let Some(old_key) = self.storage.key_from_url(old_url) {
                self.storage.delete_best_effort(&old_key).await;
            }
        }
        self.current_user(user_id).await
    }

    // =========================================================================
    // Channel profile and watch history
    // =========================================================================

    /// Channel profile by username with viewer-relative subscription flag.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> Result<ChannelProfile, AppError> {
        let user = self
            .db
            .get_user_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;

        let (subscribers_count, subscribed_to_count, is_subscribed) = tokio::try_join!(
            self.db.count_subscribers(&user.id),
            self.db.count_subscribed_to(&user.id),
            async {
                match viewer_id {
                    Some(viewer_id) => self.db.is_subscribed(viewer_id, &user.id).await,
                    None => Ok(false),
                }
            },
        )?;

        Ok(view::channel_profile(
            user,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        ))
    }

    /// The user's watched videos, most recent first.
    pub async fn watch_history(&self, user_id: &str) -> Result<Vec<VideoListItem>, AppError> {
        let videos = self.db.get_watch_history_videos(user_id).await?;
        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = view::profile_map(self.db.get_owner_profiles(&owner_ids).await?);
        Ok(view::video_list(videos, &owners))
    }
}
