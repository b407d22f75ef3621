//! Health check handler.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::warn;

use crate::dto::response::{HealthResponse, HealthServices, ServiceHealth};
use crate::state::AppState;

/// GET /health
///
/// 200 while the credential store answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = Instant::now();
    let probe = state.store.health.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (code, status, database) = match probe {
        Ok(()) => (StatusCode::OK, "ok", "up"),
        Err(e) => {
            warn!(error = %e, "Health probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            services: HealthServices {
                database: ServiceHealth {
                    status: database.to_string(),
                    latency_ms,
                },
            },
        }),
    )
}
