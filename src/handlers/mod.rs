pub mod api;
pub mod dashboard;
pub mod upload;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        // Session data
        .route("/upload", post(upload::upload))
        .route("/reset", post(upload::reset))
        // API (JSON for charts)
        .route("/api/flow", get(api::flow))
        .route("/api/categories", get(api::categories))
        .route("/api/category", get(api::category))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
