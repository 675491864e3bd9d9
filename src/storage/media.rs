//! Media storage on an S3-compatible bucket
//!
//! Handles upload, delete, and URL generation for video files and images.
//! Objects are served through a public CDN base URL.

use aws_sdk_s3::Client as S3Client;

use crate::config::StorageConfig;
use crate::error::AppError;

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

/// Media storage service
///
/// Uploads objects to an S3-compatible bucket and returns public URLs.
pub struct MediaStorage {
    client: S3Client,
    bucket: String,
    /// Public URL base, e.g. "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "cliptube-media",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Upload an object
    ///
    /// # Returns
    /// Public URL for the uploaded object
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {}", e)))?;

        Ok(self.get_public_url(key))
    }

    /// Upload a video file under the videos/ prefix.
    ///
    /// # Returns
    /// (S3 key, Public URL)
    pub async fn upload_video(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let key = format!("videos/{}.{}", id, extension_for(content_type));
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Upload a thumbnail image under the thumbnails/ prefix.
    pub async fn upload_thumbnail(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let key = format!("thumbnails/{}.{}", id, extension_for(content_type));
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Upload an avatar image under the avatars/ prefix.
    pub async fn upload_avatar(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let key = format!("avatars/{}.{}", id, extension_for(content_type));
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Upload a channel cover image under the covers/ prefix.
    pub async fn upload_cover(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let key = format!("covers/{}.{}", id, extension_for(content_type));
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Delete an object
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        Ok(())
    }

    /// Delete an object, logging instead of failing.
    ///
    /// Used for cleanup of superseded or orphaned objects where the request
    /// outcome no longer depends on the delete.
    pub async fn delete_best_effort(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            tracing::warn!("Failed to delete object {}: {}", key, e);
        }
    }

    /// Get public URL for an S3 key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    /// Recover the S3 key from a public URL this storage produced.
    ///
    /// Returns None for URLs outside the configured public base.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.public_url))
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
    }
}
