use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::post,
};

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    domain::entities::chart::ChartRequest,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/generate-graph", post(generate_graph))
}

async fn generate_graph(
    State(app_state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> AppResult<impl IntoResponse> {
    let png = app_state.chart_use_cases.render(request).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
