use serde::{Deserialize, Serialize};

/// Chart types the structured-generation step is allowed to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// Chart specification as returned by the model, before rendering concerns
/// are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub labels: Vec<String>,
    #[serde(rename = "data")]
    pub values: Vec<f64>,
    #[serde(rename = "label")]
    pub series_name: String,
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Top-level object of the structured-generation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub chart_configurations: Vec<ChartDescription>,
}

/// Chart.js configuration consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_width: u32,
    /// Per-bar fill colors (bar charts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Vec<String>>,
    /// Line stroke color (line charts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub animation: ChartAnimation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAnimation {
    pub duration: u32,
}
