use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use graphx_types::SubscriptionState;
use serde::{Deserialize, Serialize};

use super::common::current_user;
use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::{
        ports::payment_gateway::{GatewayOrder, GatewayPayment},
        use_cases::subscription::{CheckoutOrder, PaymentVerification, SwitchOutcome},
    },
};

#[derive(Deserialize)]
struct CreateOrderPayload {
    #[serde(default)]
    plan: String,
}

/// Checkout callback fields, named as the gateway's widget posts them.
#[derive(Deserialize)]
struct VerifyPayload {
    razorpay_payment_id: String,
    razorpay_order_id: String,
    razorpay_signature: String,
}

impl From<VerifyPayload> for PaymentVerification {
    fn from(payload: VerifyPayload) -> Self {
        Self {
            order_id: payload.razorpay_order_id,
            payment_id: payload.razorpay_payment_id,
            signature: payload.razorpay_signature,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwitchPlanPayload {
    #[serde(default)]
    new_plan: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusQuery {
    order_id: Option<String>,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    success: bool,
    #[serde(flatten)]
    checkout: CheckoutOrder,
}

#[derive(Serialize)]
struct VerifiedResponse {
    success: bool,
    message: &'static str,
    subscription: SubscriptionState,
}

#[derive(Serialize)]
#[serde(untagged)]
enum SwitchResponse {
    #[serde(rename_all = "camelCase")]
    Switched {
        success: bool,
        requires_payment: bool,
        subscription: SubscriptionState,
        message: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    PaymentRequired {
        success: bool,
        requires_payment: bool,
        order_id: String,
        amount: i64,
        currency: String,
        new_expiry: DateTime<Utc>,
    },
}

impl From<SwitchOutcome> for SwitchResponse {
    fn from(outcome: SwitchOutcome) -> Self {
        match outcome {
            SwitchOutcome::Switched { subscription } => Self::Switched {
                success: true,
                requires_payment: false,
                subscription,
                message: "Plan switched successfully",
            },
            SwitchOutcome::PaymentRequired {
                order_id,
                amount,
                currency,
                new_expiry,
            } => Self::PaymentRequired {
                success: true,
                requires_payment: true,
                order_id,
                amount,
                currency,
                new_expiry,
            },
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    paid: bool,
    order: GatewayOrder,
    payments: Vec<GatewayPayment>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/switch-plan", post(switch_plan))
        .route("/verify-switch", post(verify_switch))
        .route("/status", get(payment_status))
}

async fn create_order(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateOrderPayload>,
) -> AppResult<Json<CreateOrderResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let checkout = app_state
        .subscription_use_cases
        .create_order(user_id, &payload.plan, Utc::now())
        .await?;
    Ok(Json(CreateOrderResponse {
        success: true,
        checkout,
    }))
}

async fn verify_payment(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VerifyPayload>,
) -> AppResult<Json<VerifiedResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let subscription = app_state
        .subscription_use_cases
        .verify_payment(user_id, &payload.into(), Utc::now())
        .await?;
    Ok(Json(VerifiedResponse {
        success: true,
        message: "Payment verified and subscription updated",
        subscription,
    }))
}

async fn switch_plan(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SwitchPlanPayload>,
) -> AppResult<Json<SwitchResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let outcome = app_state
        .subscription_use_cases
        .switch_plan(user_id, &payload.new_plan, Utc::now())
        .await?;
    Ok(Json(outcome.into()))
}

async fn verify_switch(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VerifyPayload>,
) -> AppResult<Json<VerifiedResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let subscription = app_state
        .subscription_use_cases
        .verify_switch(user_id, &payload.into(), Utc::now())
        .await?;
    Ok(Json(VerifiedResponse {
        success: true,
        message: "Plan switched successfully",
        subscription,
    }))
}

async fn payment_status(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<StatusResponse>> {
    let user_id = current_user(&jar, &app_state)?;
    let report = app_state
        .subscription_use_cases
        .payment_status(user_id, query.order_id.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(StatusResponse {
        success: true,
        paid: report.paid,
        order: report.order,
        payments: report.payments,
    }))
}
