use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use graphx_types::{Plan, SubscriptionState};
use serde::Serialize;

use super::common::current_user;
use crate::{adapters::http::app_state::AppState, app_error::AppResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionResponse {
    success: bool,
    subscription: SubscriptionState,
    subscription_active: bool,
    plan: Option<Plan>,
}

impl From<SubscriptionState> for SubscriptionResponse {
    fn from(subscription: SubscriptionState) -> Self {
        Self {
            success: true,
            subscription_active: subscription.active,
            plan: subscription.plan,
            subscription,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_subscription))
        .route("/cancel", post(cancel_subscription))
}

async fn get_subscription(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<SubscriptionResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let subscription = app_state
        .subscription_use_cases
        .get_subscription(user_id, Utc::now())
        .await?;
    Ok(Json(subscription.into()))
}

async fn cancel_subscription(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<SubscriptionResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let subscription = app_state
        .subscription_use_cases
        .cancel_subscription(user_id)
        .await?;
    Ok(Json(subscription.into()))
}
