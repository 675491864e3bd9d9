//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, storage, and view assembly; handlers only
//! decode requests and wrap responses.

mod comment;
mod like;
mod playlist;
mod subscription;
mod tweet;
mod user;
mod video;

pub use comment::CommentService;
pub use like::{LikeService, ToggleOutcome};
pub use playlist::PlaylistService;
pub use subscription::SubscriptionService;
pub use tweet::TweetService;
pub use user::{TokenPair, UserService};
pub use video::VideoService;

/// An uploaded file already read out of the request body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub data: Vec<u8>,
    pub content_type: String,
}
