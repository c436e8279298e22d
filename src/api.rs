use std::sync::Arc;

use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::pipeline::{Pipeline, StatusView};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/status", get(status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Latest computed view models, or 404 until the first rendered cycle.
async fn dashboard(State(state): State<AppState>) -> Response {
    match state.pipeline.latest_view() {
        Some(view) => Json(view).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no data yet" })),
        )
            .into_response(),
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusView> {
    Json(state.pipeline.status())
}
