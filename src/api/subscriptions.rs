//! Subscription endpoints

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};

use super::envelope::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::EntityId;
use crate::error::AppError;
use crate::service::SubscriptionService;

/// POST /api/v1/subscriptions/channel/:channel_id/toggle
async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let channel_id = EntityId::parse(&channel_id)?;
    let subscribed = SubscriptionService::new(state.db.clone())
        .toggle(&claims.user_id, &channel_id)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "subscribed": subscribed }),
        "subscription toggled",
    ))
}

/// GET /api/v1/subscriptions/channel/:channel_id/subscribers
async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let channel_id = EntityId::parse(&channel_id)?;
    let subscribers = SubscriptionService::new(state.db.clone())
        .channel_subscribers(&channel_id)
        .await?;
    Ok(ApiResponse::ok(subscribers, "subscribers"))
}

/// GET /api/v1/subscriptions/user/:user_id/channels
async fn subscribed_channels(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = EntityId::parse(&user_id)?;
    let channels = SubscriptionService::new(state.db.clone())
        .subscribed_channels(&user_id)
        .await?;
    Ok(ApiResponse::ok(channels, "subscribed channels"))
}

pub fn subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/channel/:channel_id/toggle", post(toggle_subscription))
        .route("/channel/:channel_id/subscribers", get(channel_subscribers))
        .route("/user/:user_id/channels", get(subscribed_channels))
}
