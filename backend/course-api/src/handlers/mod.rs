use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod courses;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = serde_json::Map::new();

    let storage_healthy = match tokio::time::timeout(
        std::time::Duration::from_secs(1),
        state.courses.ping(),
    )
    .await
    {
        Ok(Ok(())) => {
            dependencies.insert(
                "mongodb".to_string(),
                json!({ "status": "healthy", "message": "MongoDB connection successful" }),
            );
            true
        }
        Ok(Err(e)) => {
            dependencies.insert(
                "mongodb".to_string(),
                json!({ "status": "unhealthy", "error": format!("MongoDB error: {}", e) }),
            );
            false
        }
        Err(_) => {
            dependencies.insert(
                "mongodb".to_string(),
                json!({ "status": "unhealthy", "error": "MongoDB timeout after 1s" }),
            );
            false
        }
    };

    let (status_code, status) = if storage_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "inculearn-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
