use std::path::Path;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::routes::{health, market};
use crate::state::AppState;

/// API routes plus the dashboard's static files from `static_dir`.
pub fn create_app(state: AppState, static_dir: &Path) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", market::router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
