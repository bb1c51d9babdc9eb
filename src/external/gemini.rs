use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::LlmConfig;
use crate::errors::LlmError;
use crate::external::llm_provider::{LlmProvider, TextGeneration, ToolResult};

/// Gemini `generateContent` request/response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    grounding_supports: Vec<GroundingSupport>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingSupport {
    segment: Option<Segment>,
    #[serde(default)]
    grounding_chunk_indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Google Gemini provider over the public REST API
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn call_gemini(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API returned {}: {}", status, error_text);
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        let body = response.json::<GenerateContentResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &body.usage_metadata {
            info!("Gemini call completed. Tokens: {} prompt + {} candidates = {} total",
                  usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count);
        }

        Ok(body)
    }

    fn user_prompt(prompt: String) -> Vec<Content> {
        vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part { text: Some(prompt) }],
        }]
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_with_search(&self, prompt: String) -> Result<TextGeneration, LlmError> {
        info!("Generating grounded text (model: {})", self.model);

        let request = GenerateContentRequest {
            contents: Self::user_prompt(prompt),
            tools: Some(vec![json!({ "google_search": {} })]),
            generation_config: None,
        };

        let response = self.call_gemini(&request).await?;
        let candidate = response.candidates
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

        Ok(TextGeneration {
            text: candidate_text(candidate),
            tool_results: grounding_tool_results(candidate.grounding_metadata.as_ref()),
        })
    }

    async fn generate_object(&self, prompt: String, schema: Value) -> Result<Value, LlmError> {
        info!("Generating structured output (model: {})", self.model);

        let request = GenerateContentRequest {
            contents: Self::user_prompt(prompt),
            tools: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        };

        let response = self.call_gemini(&request).await?;
        let candidate = response.candidates
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

        serde_json::from_str(&candidate_text(candidate))
            .map_err(|e| LlmError::InvalidResponse(format!("Structured output is not JSON: {}", e)))
    }
}

fn candidate_text(candidate: &Candidate) -> String {
    candidate.content.parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect()
}

/// Grounding chunks are what the search tool returned; expose them as a
/// single `google_search` result shaped `{ "results": [...] }`.
fn grounding_tool_results(metadata: Option<&GroundingMetadata>) -> Vec<ToolResult> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };
    if metadata.grounding_chunks.is_empty() {
        return Vec::new();
    }

    // first supporting text segment per chunk
    let mut snippets: HashMap<usize, &str> = HashMap::new();
    for support in &metadata.grounding_supports {
        if let Some(segment) = &support.segment {
            for &index in &support.grounding_chunk_indices {
                snippets.entry(index).or_insert(segment.text.as_str());
            }
        }
    }

    let results: Vec<Value> = metadata.grounding_chunks
        .iter()
        .enumerate()
        .filter_map(|(index, chunk)| {
            chunk.web.as_ref().map(|web| json!({
                "title": web.title,
                "url": web.uri,
                "description": snippets.get(&index).copied().unwrap_or_default(),
            }))
        })
        .collect();

    vec![ToolResult::web_search(json!({ "results": results }))]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_candidate(raw: Value) -> Candidate {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let candidate = parse_candidate(json!({
            "content": { "role": "model", "parts": [{ "text": "Market " }, { "text": "grew 12%." }] }
        }));
        assert_eq!(candidate_text(&candidate), "Market grew 12%.");
    }

    #[test]
    fn test_grounding_chunks_become_search_results() {
        let candidate = parse_candidate(json!({
            "content": { "parts": [{ "text": "..." }] },
            "groundingMetadata": {
                "groundingChunks": [
                    { "web": { "uri": "https://a.example/report", "title": "a.example" } },
                    { "web": { "uri": "https://b.example/stats", "title": "b.example" } }
                ],
                "groundingSupports": [
                    { "segment": { "text": "Volumes rose." }, "groundingChunkIndices": [1] }
                ]
            }
        }));

        let results = grounding_tool_results(candidate.grounding_metadata.as_ref());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_name, "google_search");

        let payload = results[0].result.as_ref().unwrap();
        let entries = payload["results"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["url"], "https://a.example/report");
        assert_eq!(entries[0]["description"], "");
        assert_eq!(entries[1]["description"], "Volumes rose.");
    }

    #[test]
    fn test_no_grounding_means_no_tool_results() {
        let candidate = parse_candidate(json!({ "content": { "parts": [{ "text": "plain" }] } }));
        assert!(grounding_tool_results(candidate.grounding_metadata.as_ref()).is_empty());
    }

    #[test]
    fn test_provider_trims_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:9999/v1beta/".to_string(),
            ..LlmConfig::default()
        };
        let provider = GeminiProvider::new("key".to_string(), &config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1beta");
        assert_eq!(provider.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_request_serializes_search_tool() {
        let request = GenerateContentRequest {
            contents: GeminiProvider::user_prompt("hello".to_string()),
            tools: Some(vec![json!({ "google_search": {} })]),
            generation_config: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["tools"][0], json!({ "google_search": {} }));
        assert!(value.get("generationConfig").is_none());
    }
}
