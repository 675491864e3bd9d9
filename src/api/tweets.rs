//! Tweet endpoints

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;

use super::envelope::ApiResponse;
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::TweetService;

#[derive(Debug, Deserialize)]
struct TweetRequest {
    content: String,
}

/// POST /api/v1/tweets
async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(req): axum::Json<TweetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tweet = TweetService::new(state.db.clone())
        .create(&claims.user_id, &req.content)
        .await?;
    Ok(ApiResponse::created(tweet, "tweet created"))
}

/// GET /api/v1/tweets
async fn all_tweets(
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let tweets = TweetService::new(state.db.clone())
        .all(viewer.viewer_id())
        .await?;
    Ok(ApiResponse::ok(tweets, "tweets"))
}

/// GET /api/v1/tweets/user/:user_id
async fn user_tweets(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = EntityId::parse(&user_id)?;
    let tweets = TweetService::new(state.db.clone())
        .user_tweets(&user_id, viewer.viewer_id())
        .await?;
    Ok(ApiResponse::ok(tweets, "user tweets"))
}

/// GET /api/v1/tweets/feed
///
/// Tweets from channels the caller subscribes to.
async fn subscription_feed(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let tweets = TweetService::new(state.db.clone())
        .subscription_feed(&claims.user_id)
        .await?;
    Ok(ApiResponse::ok(tweets, "subscription feed"))
}

/// PATCH /api/v1/tweets/:id (owner only)
async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<TweetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    let tweet = TweetService::new(state.db.clone())
        .update(&id, &claims.user_id, &req.content)
        .await?;
    Ok(ApiResponse::ok(tweet, "tweet updated"))
}

/// DELETE /api/v1/tweets/:id (owner only)
async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = EntityId::parse(&id)?;
    TweetService::new(state.db.clone())
        .delete(&id, &claims.user_id)
        .await?;
    Ok(ApiResponse::ok((), "tweet deleted"))
}

pub fn tweets_router() -> Router<AppState> {
    Router::new()
        .route("/", get(all_tweets).post(create_tweet))
        .route("/user/:user_id", get(user_tweets))
        .route("/feed", get(subscription_feed))
        .route("/:id", patch(update_tweet).delete(delete_tweet))
}
