//! Liveness endpoint: database reachability plus migration status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use verdant_db::migrations;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    migrations_applied: usize,
    migrations_total: usize,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if !state.db.health_check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                migrations_applied: 0,
                migrations_total: 0,
            }),
        );
    }

    let (total, applied) = migrations::migration_status(state.db.pool())
        .await
        .unwrap_or((0, 0));

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            migrations_applied: applied,
            migrations_total: total,
        }),
    )
}
