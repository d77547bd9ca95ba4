use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::chart::SavedChart,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveChartPayload {
    #[serde(default)]
    email: String,
    chart_details: Option<Value>,
}

#[derive(Serialize)]
struct ChartsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    charts: Vec<SavedChart>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_chart))
        .route("/charts/{email}", get(list_charts))
        .route("/delete/{email}/{serial}", delete(delete_chart))
}

async fn save_chart(
    State(app_state): State<AppState>,
    Json(payload): Json<SaveChartPayload>,
) -> AppResult<Json<ChartsResponse>> {
    let charts = app_state
        .chart_use_cases
        .save_chart(&payload.email, payload.chart_details)
        .await?;
    Ok(Json(ChartsResponse {
        message: Some("Chart saved successfully!".to_string()),
        charts,
    }))
}

async fn list_charts(
    State(app_state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<ChartsResponse>> {
    let charts = app_state.chart_use_cases.list_charts(&email).await?;
    Ok(Json(ChartsResponse {
        message: None,
        charts,
    }))
}

async fn delete_chart(
    State(app_state): State<AppState>,
    Path((email, serial)): Path<(String, String)>,
) -> AppResult<Json<ChartsResponse>> {
    // A serial that is not a number can never match; the email is still checked first.
    let Ok(serial_no) = serial.trim().parse::<u32>() else {
        app_state.chart_use_cases.list_charts(&email).await?;
        return Err(AppError::NotFound("Chart not found.".into()));
    };
    let charts = app_state
        .chart_use_cases
        .delete_chart(&email, serial_no)
        .await?;
    Ok(Json(ChartsResponse {
        message: Some(format!("Chart with serial {serial} deleted successfully.")),
        charts,
    }))
}
