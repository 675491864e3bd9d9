//! Storage module
//!
//! S3-compatible object storage for videos, thumbnails, avatars and covers.

mod media;

pub use media::MediaStorage;
