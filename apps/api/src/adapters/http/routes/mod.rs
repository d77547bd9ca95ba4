pub mod auth;
pub mod chart;
pub mod common;
pub mod graph;
pub mod payment;
pub mod subscription;

use axum::{Json, Router, routing::get};
use chrono::Utc;
use serde::Serialize;

use crate::adapters::http::app_state::AppState;

#[derive(Serialize)]
struct WelcomeResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .merge(auth::router())
        .nest("/api/subscription", subscription::router())
        .nest("/api/payment", payment::router())
        .nest("/chartRoutes", chart::router())
        .nest("/ap", graph::router())
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Graph-X API",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}
