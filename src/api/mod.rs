//! API layer
//!
//! HTTP handlers grouped per entity, all mounted under `/api/v1`.
//! Handlers decode requests, call a service, and wrap the result in the
//! response envelope.

mod comments;
mod envelope;
mod form;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

pub use envelope::ApiResponse;

use axum::Router;

use crate::AppState;

/// All entity routers combined, relative to `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::users_router())
        .nest("/videos", videos::videos_router())
        .nest("/comments", comments::comments_router())
        .nest("/likes", likes::likes_router())
        .nest("/playlists", playlists::playlists_router())
        .nest("/subscriptions", subscriptions::subscriptions_router())
        .nest("/tweets", tweets::tweets_router())
}
