//! In-memory mock implementations for chart storage and rendering.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    app_error::AppResult,
    application::use_cases::chart::{ChartRenderer, ChartRepo},
    domain::entities::chart::UserCharts,
};

#[derive(Default)]
pub struct InMemoryChartRepo {
    pub charts: Mutex<HashMap<String, UserCharts>>,
}

impl InMemoryChartRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChartRepo for InMemoryChartRepo {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserCharts>> {
        Ok(self.charts.lock().unwrap().get(email).cloned())
    }

    async fn save(&self, charts: &UserCharts) -> AppResult<()> {
        self.charts
            .lock()
            .unwrap()
            .insert(charts.email.clone(), charts.clone());
        Ok(())
    }
}

/// Minimal PNG signature followed by a marker; enough for content checks.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-chart";

/// Renderer that records the last config it was given.
#[derive(Default)]
pub struct RecordingChartRenderer {
    calls: Mutex<Vec<(Value, u32, u32)>>,
}

impl RecordingChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<(Value, u32, u32)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChartRenderer for RecordingChartRenderer {
    async fn render_png(&self, config: &Value, width: u32, height: u32) -> AppResult<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((config.clone(), width, height));
        Ok(FAKE_PNG.to_vec())
    }
}
