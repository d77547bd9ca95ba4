use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::chart::{
        CHART_HEIGHT, CHART_WIDTH, ChartRequest, ChartSpec, ChartType, ColorScheme, SavedChart,
        UserCharts,
    },
};

#[async_trait]
pub trait ChartRepo: Send + Sync {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserCharts>>;
    /// Insert or replace the whole document for `charts.email`.
    async fn save(&self, charts: &UserCharts) -> AppResult<()>;
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Render a Chart.js configuration to PNG bytes.
    async fn render_png(&self, config: &Value, width: u32, height: u32) -> AppResult<Vec<u8>>;
}

#[derive(Clone)]
pub struct ChartUseCases {
    repo: Arc<dyn ChartRepo>,
    renderer: Arc<dyn ChartRenderer>,
}

impl ChartUseCases {
    pub fn new(repo: Arc<dyn ChartRepo>, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { repo, renderer }
    }

    #[instrument(skip(self, request))]
    pub async fn render(&self, request: ChartRequest) -> AppResult<Vec<u8>> {
        let spec = validate_request(request)?;
        let config = spec.to_chartjs_config();
        self.renderer
            .render_png(&config, CHART_WIDTH, CHART_HEIGHT)
            .await
    }

    #[instrument(skip(self, chart_details))]
    pub async fn save_chart(
        &self,
        email: &str,
        chart_details: Option<Value>,
    ) -> AppResult<Vec<SavedChart>> {
        let email = email.trim();
        let chart_details = chart_details.filter(|details| !details.is_null());
        let (false, Some(chart_details)) = (email.is_empty(), chart_details) else {
            return Err(AppError::InvalidInput(
                "Email and chartDetails are required.".into(),
            ));
        };

        let mut charts = self
            .repo
            .get_by_email(email)
            .await?
            .unwrap_or_else(|| UserCharts::new(email));
        let serial = charts.push(chart_details);
        self.repo.save(&charts).await?;

        tracing::debug!(serial, "Saved chart");
        Ok(charts.charts)
    }

    #[instrument(skip(self))]
    pub async fn list_charts(&self, email: &str) -> AppResult<Vec<SavedChart>> {
        self.repo
            .get_by_email(email)
            .await?
            .map(|charts| charts.charts)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete_chart(&self, email: &str, serial: u32) -> AppResult<Vec<SavedChart>> {
        let mut charts = self
            .repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
        if !charts.remove(serial) {
            return Err(AppError::NotFound("Chart not found.".into()));
        }
        self.repo.save(&charts).await?;
        Ok(charts.charts)
    }
}

fn validate_request(request: ChartRequest) -> AppResult<ChartSpec> {
    let (Some(labels), Some(data), Some(graph_type)) =
        (request.xvalues, request.yvalues, request.graph_type)
    else {
        return Err(AppError::InvalidInput(
            "Missing xvalues, yvalues, or graphType!".into(),
        ));
    };
    let chart_type: ChartType = graph_type
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Unsupported graphType: {graph_type}")))?;

    Ok(ChartSpec {
        chart_type,
        labels,
        data,
        title: request.title,
        scheme: ColorScheme::from_id(request.color_scheme.as_deref()),
        options: request.options.unwrap_or_default(),
    })
}
