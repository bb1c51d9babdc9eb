use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::errors::{FetchError, LlmError};
use crate::external::gemini::GeminiProvider;
use crate::external::llm_provider::LlmProvider;
use crate::models::{ChartSet, MarketReport};
use crate::services::chart_config::build_chart_config;
use crate::services::report_store::ReportStore;
use crate::services::source_normalizer::normalize_sources;

/// Runs the research -> sources -> charts pipeline and publishes the result
/// to the report store.
pub struct MarketDataService {
    provider: Option<Arc<dyn LlmProvider>>,
    store: ReportStore,
    default_topic: String,
}

impl MarketDataService {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, store: ReportStore, default_topic: String) -> Self {
        Self {
            provider,
            store,
            default_topic,
        }
    }

    /// Build the service around a Gemini client, or disabled when no API key
    /// is configured.
    pub fn from_config(config: &LlmConfig, store: ReportStore, default_topic: String) -> Result<Self, LlmError> {
        let provider = match config.api_key.as_deref() {
            Some(api_key) => {
                info!("Initializing Gemini provider (model: {})", config.model);
                Some(Arc::new(GeminiProvider::new(api_key.to_string(), config)?) as Arc<dyn LlmProvider>)
            }
            None => {
                warn!("Gemini API key not configured. Market data fetches will fail.");
                None
            }
        };

        Ok(Self::new(provider, store, default_topic))
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn default_topic(&self) -> &str {
        &self.default_topic
    }

    /// Fetch a fresh report for `topic` (blank or `None` means the default
    /// topic). The store is only written when every step succeeds.
    pub async fn fetch(&self, topic: Option<&str>) -> Result<Arc<MarketReport>, FetchError> {
        let topic = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.default_topic.as_str())
            .to_string();

        let span = info_span!("market_fetch", fetch_id = %Uuid::new_v4(), topic = %topic);

        async {
            match self.run_pipeline(&topic).await {
                Ok(report) => Ok(self.store.replace(report)),
                Err(e) => {
                    error!("Error fetching market data: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(&self, topic: &str) -> Result<MarketReport, FetchError> {
        let provider = self.provider.as_ref().ok_or(LlmError::Disabled)?;

        info!("Fetching market data for: {}", topic);
        let research = provider.generate_with_search(build_research_prompt(topic)).await?;
        info!("Market trends found. Tool results: {}", research.tool_results.len());

        let sources = normalize_sources(topic, &research.tool_results, Utc::now().date_naive());
        info!("Final sources count: {}", sources.len());

        let raw = provider
            .generate_object(build_chart_prompt(&research.text), chart_schema())
            .await?;
        let chart_set: ChartSet = serde_json::from_value(raw)
            .map_err(|e| LlmError::InvalidResponse(format!("Chart data does not match schema: {}", e)))?;

        for description in &chart_set.chart_configurations {
            if description.labels.len() != description.values.len() {
                warn!(
                    "Chart '{}' has {} labels but {} values",
                    description.series_name,
                    description.labels.len(),
                    description.values.len()
                );
            }
        }

        let charts = chart_set.chart_configurations
            .iter()
            .map(build_chart_config)
            .collect::<Vec<_>>();
        info!("Chart configurations generated: {}", charts.len());

        Ok(MarketReport {
            narrative: research.text,
            charts,
            sources,
            generated_at: Utc::now(),
        })
    }
}

pub fn build_research_prompt(topic: &str) -> String {
    format!(
        r#"Search the web for market trends for {} for 2024-2025.
I need to know the market size, key players and their market share, and primary consumer drivers.
Please provide comprehensive information with sources."#,
        topic
    )
}

pub fn build_chart_prompt(market_trends: &str) -> String {
    format!(
        r#"Given the following market trends text, come up with a list of 1-3 meaningful bar or line charts
and generate chart data.

Market Trends:
{}"#,
        market_trends
    )
}

/// Response schema for the structured-generation call
pub fn chart_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "chartConfigurations": {
                "type": "ARRAY",
                "description": "A list of chart configurations",
                "minItems": 1,
                "maxItems": 3,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": ["bar", "line"],
                            "description": "The type of chart to generate. Either \"bar\" or \"line\""
                        },
                        "labels": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "A list of chart labels"
                        },
                        "data": {
                            "type": "ARRAY",
                            "items": { "type": "NUMBER" },
                            "description": "A list of the chart data"
                        },
                        "label": {
                            "type": "STRING",
                            "description": "A label for the chart"
                        },
                        "colors": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "A list of colors to use for the chart, e.g. \"rgba(255, 99, 132, 0.8)\""
                        }
                    },
                    "required": ["type", "labels", "data", "label", "colors"]
                }
            }
        },
        "required": ["chartConfigurations"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::external::llm_provider::{TextGeneration, ToolResult};
    use crate::models::ChartKind;

    /// Scripted provider: pops one outcome per structured call.
    struct ScriptedProvider {
        text: String,
        tool_results: Vec<ToolResult>,
        objects: Mutex<Vec<Result<Value, LlmError>>>,
        prompts: Mutex<Vec<String>>,
        search_calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(text: &str, tool_results: Vec<ToolResult>, objects: Vec<Result<Value, LlmError>>) -> Self {
            Self {
                text: text.to_string(),
                tool_results,
                objects: Mutex::new(objects),
                prompts: Mutex::new(Vec::new()),
                search_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate_with_search(&self, prompt: String) -> Result<TextGeneration, LlmError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt);
            Ok(TextGeneration {
                text: self.text.clone(),
                tool_results: self.tool_results.clone(),
            })
        }

        async fn generate_object(&self, prompt: String, _schema: Value) -> Result<Value, LlmError> {
            self.prompts.lock().push(prompt);
            self.objects.lock().remove(0)
        }
    }

    fn bar_chart_set() -> Value {
        json!({
            "chartConfigurations": [{
                "type": "bar",
                "labels": ["Oatly", "Silk"],
                "data": [35.0, 25.0],
                "label": "Market share (%)",
                "colors": ["rgba(255, 99, 132, 0.8)", "rgba(54, 162, 235, 0.8)"]
            }]
        })
    }

    fn service(provider: Arc<ScriptedProvider>) -> MarketDataService {
        MarketDataService::new(Some(provider as Arc<dyn LlmProvider>), ReportStore::new(), "plant-based milk in North America".to_string())
    }

    #[tokio::test]
    async fn test_fetch_builds_and_stores_report() {
        let provider = Arc::new(ScriptedProvider::new("Oat milk leads growth.", vec![], vec![Ok(bar_chart_set())]));
        let service = service(provider.clone());

        let report = service.fetch(Some("avocado exports")).await.unwrap();

        assert_eq!(report.narrative, "Oat milk leads growth.");
        assert_eq!(report.charts.len(), 1);
        assert_eq!(report.charts[0].kind, ChartKind::Bar);
        assert_eq!(report.sources.len(), 3);
        assert!(Arc::ptr_eq(&report, &service.store().latest().unwrap()));

        let prompts = provider.prompts.lock();
        assert!(prompts[0].contains("market trends for avocado exports for 2024-2025"));
        assert!(prompts[1].ends_with("Oat milk leads growth."));
        assert_eq!(provider.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_topic_uses_default() {
        let provider = Arc::new(ScriptedProvider::new("text", vec![], vec![Ok(bar_chart_set())]));
        let service = service(provider.clone());

        service.fetch(Some("   ")).await.unwrap();

        assert!(provider.prompts.lock()[0].contains("plant-based milk in North America"));
    }

    #[tokio::test]
    async fn test_live_sources_are_kept() {
        let tool_results = vec![ToolResult::web_search(json!({
            "items": [{ "title": "Nielsen", "url": "https://nielsen.example", "description": "Scan data" }]
        }))];
        let provider = Arc::new(ScriptedProvider::new("text", tool_results, vec![Ok(bar_chart_set())]));

        let report = service(provider).fetch(None).await.unwrap();

        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].title, "Nielsen");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_report() {
        let provider = Arc::new(ScriptedProvider::new(
            "first",
            vec![],
            vec![Ok(bar_chart_set()), Err(LlmError::RateLimited)],
        ));
        let service = service(provider);

        let first = service.fetch(None).await.unwrap();
        let second = service.fetch(None).await;

        assert!(matches!(second, Err(FetchError::ExternalService(LlmError::RateLimited))));
        assert!(Arc::ptr_eq(&first, &service.store().latest().unwrap()));
    }

    #[tokio::test]
    async fn test_failed_first_fetch_leaves_store_empty() {
        let provider = Arc::new(ScriptedProvider::new("text", vec![], vec![Err(LlmError::Timeout)]));
        let service = service(provider);

        assert!(service.fetch(None).await.is_err());
        assert!(service.store().latest().is_none());
    }

    #[tokio::test]
    async fn test_schema_violation_is_external_error() {
        let bad = json!({ "chartConfigurations": [{ "type": "pie", "labels": [], "data": [], "label": "x", "colors": [] }] });
        let provider = Arc::new(ScriptedProvider::new("text", vec![], vec![Ok(bad)]));
        let service = service(provider);

        let result = service.fetch(None).await;

        assert!(matches!(result, Err(FetchError::ExternalService(LlmError::InvalidResponse(_)))));
        assert!(service.store().latest().is_none());
    }

    #[tokio::test]
    async fn test_disabled_service_fails_without_calls() {
        let service = MarketDataService::new(None, ReportStore::new(), "topic".to_string());
        assert!(!service.is_enabled());

        let result = service.fetch(None).await;
        assert!(matches!(result, Err(FetchError::ExternalService(LlmError::Disabled))));
    }

    #[test]
    fn test_chart_schema_limits_chart_count() {
        let schema = chart_schema();
        let charts = &schema["properties"]["chartConfigurations"];
        assert_eq!(charts["minItems"], 1);
        assert_eq!(charts["maxItems"], 3);
        assert_eq!(charts["items"]["properties"]["type"]["enum"], json!(["bar", "line"]));
    }
}
