//! Session endpoints: drawer lifecycle and counter increments.
//!
//! Identity (vendor, operator) always travels as explicit request fields,
//! never as an ambient header.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use verdant_core::validation::{validate_counter_amount, validate_id, validate_non_negative_cents};
use verdant_core::{Session, SessionCounter};
use verdant_db::OpenSessionRequest;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/get-or-create", post(get_or_create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/increment", post(increment_counter))
        .route("/sessions/{id}/end", post(end_session))
}

#[derive(Debug, Deserialize)]
struct GetOrCreateBody {
    register_id: String,
    location_id: String,
    vendor_id: String,
    /// The operator opening the drawer.
    user_id: String,
    opening_cash_cents: Option<i64>,
}

/// Find-or-create: repeat calls for the same register return the same open
/// session, so the terminal can safely retry.
async fn get_or_create_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GetOrCreateBody>,
) -> ApiResult<Json<Session>> {
    validate_id("register_id", &body.register_id)?;
    validate_id("location_id", &body.location_id)?;
    validate_id("vendor_id", &body.vendor_id)?;
    validate_id("user_id", &body.user_id)?;
    if let Some(cents) = body.opening_cash_cents {
        validate_non_negative_cents("opening_cash_cents", cents)?;
    }

    let session = state
        .db
        .sessions()
        .get_or_create(OpenSessionRequest {
            register_id: body.register_id,
            location_id: body.location_id,
            vendor_id: body.vendor_id,
            operator_id: body.user_id,
            opening_cash_cents: body.opening_cash_cents,
        })
        .await?;

    Ok(Json(session))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    let session = state
        .db
        .sessions()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {id}")))?;

    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
struct IncrementBody {
    counter_name: String,
    amount: i64,
}

async fn increment_counter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<IncrementBody>,
) -> ApiResult<Json<Session>> {
    let counter = SessionCounter::parse(&body.counter_name).ok_or_else(|| {
        ApiError::Validation(format!("unknown counter: {}", body.counter_name))
    })?;
    validate_counter_amount(body.amount)?;

    let session = state
        .db
        .sessions()
        .increment_counter(&id, counter, body.amount)
        .await?;

    Ok(Json(session))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    let session = state.db.sessions().end(&id).await?;
    Ok(Json(session))
}
