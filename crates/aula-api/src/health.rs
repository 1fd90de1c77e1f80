//! Unauthenticated liveness check.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use aula_core::store::AcademicStore;

use crate::AppState;

/// `GET /health/` — 200 when the store answers a trivial query, 503 otherwise.
pub async fn handler<S: AcademicStore>(
  State(state): State<AppState<S>>,
) -> impl IntoResponse {
  match state.store.ping().await {
    Ok(()) => (
      StatusCode::OK,
      Json(json!({ "status": "healthy", "database": "connected" })),
    ),
    Err(e) => {
      tracing::error!(error = %e, "health check failed");
      (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
          "status": "unhealthy",
          "database": "error",
          "error": e.to_string(),
        })),
      )
    }
  }
}
