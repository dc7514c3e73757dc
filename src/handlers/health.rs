use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{database::Store, handlers::AppState};

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Process is up")), tag = "health")]
pub async fn liveness() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "health"
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, db_status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let body = Json(json!({
        "status": if status == StatusCode::OK { "ready" } else { "not_ready" },
        "checks": {
            "database": db_status
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }));

    (status, body)
}
