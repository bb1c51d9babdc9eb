use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    llm_enabled: bool,
    last_updated: Option<DateTime<Utc>>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    info!("GET /health - Health check");
    Json(HealthResponse {
        status: "OK",
        llm_enabled: state.market_data.is_enabled(),
        last_updated: state.reports.latest().map(|r| r.generated_at),
    })
}
