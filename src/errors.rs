use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Failures of the external model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM features are disabled")]
    Disabled,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by model provider")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the market data pipeline
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("External service error: {0}")]
    ExternalService(#[from] LlmError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    /// A fetch failed. Only `message` reaches the client.
    #[error("{message}: {source}")]
    Fetch {
        message: &'static str,
        #[source]
        source: FetchError,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn fetch(message: &'static str, source: FetchError) -> Self {
        AppError::Fetch { message, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Fetch { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}
