use async_trait::async_trait;
use serde_json::Value;

use crate::errors::LlmError;

/// Name the web-search tool is registered under.
pub const WEB_SEARCH_TOOL: &str = "google_search";

/// One tool invocation made while generating text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_name: String,
    /// Raw payload, shape depends on the tool
    pub result: Option<Value>,
}

impl ToolResult {
    pub fn web_search(result: Value) -> Self {
        Self {
            tool_name: WEB_SEARCH_TOOL.to_string(),
            result: Some(result),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextGeneration {
    pub text: String,
    pub tool_results: Vec<ToolResult>,
}

/// Model provider used by the market data pipeline
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Free-text generation with web search available as a tool
    async fn generate_with_search(&self, prompt: String) -> Result<TextGeneration, LlmError>;

    /// Generation constrained to `schema`; returns the parsed JSON object
    async fn generate_object(&self, prompt: String, schema: Value) -> Result<Value, LlmError>;
}
