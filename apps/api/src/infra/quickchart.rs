use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    use_cases::chart::ChartRenderer,
};

/// Renders Chart.js configs through a QuickChart-compatible `/chart` endpoint.
#[derive(Clone)]
pub struct QuickChartRenderer {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct RenderReq<'a> {
    width: u32,
    height: u32,
    format: &'static str,
    #[serde(rename = "backgroundColor")]
    background_color: &'static str,
    chart: &'a Value,
}

impl QuickChartRenderer {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self) -> AppResult<Url> {
        self.base_url
            .join("chart")
            .map_err(|e| AppError::Internal(format!("Invalid chart renderer URL: {e}")))
    }
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn render_png(&self, config: &Value, width: u32, height: u32) -> AppResult<Vec<u8>> {
        let body = RenderReq {
            width,
            height,
            format: "png",
            background_color: "white",
            chart: config,
        };
        let response = self
            .client
            .post(self.endpoint()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Chart renderer request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Chart renderer error");
            return Err(AppError::Internal(format!("Chart renderer error ({status})")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read chart image: {e}")))?;
        Ok(bytes.to_vec())
    }
}
