use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::chart::ChartConfig;

/// One citation shown under the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl SourceRecord {
    pub fn new(title: &str, url: &str, description: &str, date: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            date: date.to_string(),
        }
    }

    /// Build a record from one raw search entry. Never fails: search tools
    /// disagree on field names and types, so the first present alias wins,
    /// scalars are stringified and anything missing or `null` becomes "".
    pub fn from_search_entry(entry: &Map<String, Value>) -> Self {
        Self {
            title: first_text(entry, &["title", "name"]),
            url: first_text(entry, &["url", "link", "uri"]),
            description: first_text(entry, &["description", "snippet"]),
            date: first_text(entry, &["date", "published", "publishedAt"]),
        }
    }
}

fn first_text(entry: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| entry.get(*k).filter(|v| !v.is_null()))
        .map(value_to_text)
        .unwrap_or_default()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Result of one fetch cycle, as served by `/api/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    #[serde(rename = "marketTrends")]
    pub narrative: String,
    #[serde(rename = "chartConfigs")]
    pub charts: Vec<ChartConfig>,
    pub sources: Vec<SourceRecord>,
    #[serde(rename = "lastUpdated")]
    pub generated_at: DateTime<Utc>,
}

/// Body of `POST /api/refresh`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub topic: Option<String>,
}
