//! Register endpoints: terminal registry for the store picker.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use verdant_core::validation::validate_id;
use verdant_core::Register;
use verdant_db::NewRegister;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registers", get(list_registers).post(create_register))
        .route("/registers/{id}", get(get_register))
        .route("/registers/{id}/deactivate", post(deactivate_register))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    location_id: Option<String>,
}

async fn list_registers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Register>>> {
    let location_id = query
        .location_id
        .ok_or_else(|| ApiError::Validation("location_id is required".to_string()))?;
    validate_id("location_id", &location_id)?;

    let registers = state.db.registers().list(&location_id).await?;
    Ok(Json(registers))
}

async fn get_register(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Register>> {
    let register = state
        .db
        .registers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Register not found: {id}")))?;

    Ok(Json(register))
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    location_id: String,
    vendor_id: String,
    name: String,
}

async fn create_register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateBody>,
) -> ApiResult<Json<Register>> {
    validate_id("location_id", &body.location_id)?;
    validate_id("vendor_id", &body.vendor_id)?;
    validate_id("name", &body.name)?;

    let register = state
        .db
        .registers()
        .insert(NewRegister {
            location_id: body.location_id,
            vendor_id: body.vendor_id,
            name: body.name,
        })
        .await?;

    Ok(Json(register))
}

async fn deactivate_register(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Register>> {
    state.db.registers().deactivate(&id).await?;

    let register = state
        .db
        .registers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Register not found: {id}")))?;

    Ok(Json(register))
}
