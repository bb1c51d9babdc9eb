use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{MarketReport, RefreshRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data", get(get_market_data))
        .route("/refresh", post(refresh_market_data))
}

/// GET /api/data
/// Latest cached report; the first call fetches the default topic.
async fn get_market_data(
    State(state): State<AppState>,
) -> Result<Json<Arc<MarketReport>>, AppError> {
    info!("GET /api/data");

    if let Some(report) = state.reports.latest() {
        return Ok(Json(report));
    }

    info!("No cached report yet, fetching default topic");
    let report = state.market_data
        .fetch(None)
        .await
        .map_err(|e| {
            error!("Failed to fetch market data: {}", e);
            AppError::fetch("Failed to fetch market data", e)
        })?;

    Ok(Json(report))
}

/// POST /api/refresh
/// Body `{ "topic"?: string }`; an empty body refreshes the default topic.
async fn refresh_market_data(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Arc<MarketReport>>, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid refresh request: {}", e)))?
    };

    info!("POST /api/refresh - topic: {:?}", request.topic);

    let report = state.market_data
        .fetch(request.topic.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to refresh market data: {}", e);
            AppError::fetch("Failed to refresh market data", e)
        })?;

    Ok(Json(report))
}
