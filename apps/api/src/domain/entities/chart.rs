use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, EnumString};

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 600;

/// A chart definition saved by a user. `chart_details` is opaque to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChart {
    pub serial: u32,
    pub chart_details: Value,
}

/// All saved charts for one email, serials always `1..=n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCharts {
    pub email: String,
    pub charts: Vec<SavedChart>,
}

impl UserCharts {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            charts: Vec::new(),
        }
    }

    /// Append with the next serial and return it.
    pub fn push(&mut self, chart_details: Value) -> u32 {
        let serial = self.charts.len() as u32 + 1;
        self.charts.push(SavedChart {
            serial,
            chart_details,
        });
        serial
    }

    /// Remove a chart by serial and renumber the rest. False when the serial is unknown.
    pub fn remove(&mut self, serial: u32) -> bool {
        let before = self.charts.len();
        self.charts.retain(|chart| chart.serial != serial);
        if self.charts.len() == before {
            return false;
        }
        for (index, chart) in self.charts.iter_mut().enumerate() {
            chart.serial = index as u32 + 1;
        }
        true
    }
}

/// Chart.js chart types the renderer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    PolarArea,
    Bubble,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Default,
    Vibrant,
    Pastel,
    Mono,
}

impl ColorScheme {
    /// Unknown or missing ids fall back to the default palette.
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            Some("vibrant") => ColorScheme::Vibrant,
            Some("pastel") => ColorScheme::Pastel,
            Some("mono") => ColorScheme::Mono,
            _ => ColorScheme::Default,
        }
    }

    pub fn colors(&self) -> [&'static str; 5] {
        match self {
            ColorScheme::Default => ["#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6"],
            ColorScheme::Vibrant => ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF"],
            ColorScheme::Pastel => ["#A2D2FF", "#FFAFCC", "#BDE0FE", "#CDB4DB", "#FFC8DD"],
            ColorScheme::Mono => ["#6B7280", "#6B7280", "#6B7280", "#6B7280", "#6B7280"],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartOptions {
    pub responsive: Option<bool>,
    pub animation: Option<bool>,
}

/// Body of a chart generation request. Required fields are optional here so
/// that their absence can be reported as a validation error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub xvalues: Option<Vec<Value>>,
    pub yvalues: Option<Vec<Value>>,
    pub graph_type: Option<String>,
    pub title: Option<String>,
    pub color_scheme: Option<String>,
    pub options: Option<ChartOptions>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub labels: Vec<Value>,
    pub data: Vec<Value>,
    pub title: Option<String>,
    pub scheme: ColorScheme,
    pub options: ChartOptions,
}

impl ChartSpec {
    /// Chart.js configuration object.
    pub fn to_chartjs_config(&self) -> Value {
        let colors = self.scheme.colors();
        let title = self.title.as_deref().filter(|t| !t.is_empty());
        json!({
            "type": self.chart_type.as_ref(),
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": title.unwrap_or("Dataset"),
                    "data": self.data,
                    "backgroundColor": colors,
                    "borderColor": colors,
                    "borderWidth": 1,
                }],
            },
            "options": {
                "responsive": self.options.responsive.unwrap_or(true),
                "animation": self.options.animation.unwrap_or(true),
                "plugins": {
                    "title": {
                        "display": title.is_some(),
                        "text": title,
                        "font": { "size": 18 },
                    },
                },
            },
        })
    }
}
