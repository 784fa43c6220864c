//! Stock movement endpoints: the inventory ledger surface.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use verdant_core::validation::{validate_id, validate_non_negative_cents, validate_quantity};
use verdant_core::{CoreError, MovementType, StockMovement};
use verdant_db::{MovementFilter, RecordMovementRequest};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/stock-movements", get(list_movements).post(record_movement))
}

/// Request body for recording a movement.
///
/// The record can be addressed two ways: by `inventory_id` directly, or by
/// `product_id` + `location_id`. `vendor_id` is only needed when receiving
/// creates the record (there is nothing to take the owner from yet).
#[derive(Debug, Deserialize)]
struct RecordBody {
    inventory_id: Option<String>,
    product_id: Option<String>,
    location_id: Option<String>,
    vendor_id: Option<String>,
    /// Wire name of the movement type; the class it belongs to decides
    /// whether quantity is applied inbound or outbound.
    movement_type: String,
    quantity: i64,
    cost_per_unit_cents: Option<i64>,
    from_location_id: Option<String>,
    to_location_id: Option<String>,
    reference_type: Option<String>,
    reference_id: Option<String>,
}

async fn record_movement(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RecordBody>,
) -> ApiResult<Json<StockMovement>> {
    validate_quantity(body.quantity)?;
    if let Some(cost) = body.cost_per_unit_cents {
        validate_non_negative_cents("cost_per_unit_cents", cost)?;
    }

    let movement_type: MovementType = body
        .movement_type
        .parse()
        .map_err(|e: CoreError| ApiError::from(e))?;

    let (product_id, location_id, vendor_id) = resolve_target(&state, &body).await?;

    let movement = state
        .db
        .inventory()
        .record_movement(RecordMovementRequest {
            product_id,
            location_id,
            vendor_id,
            movement_type,
            quantity: body.quantity,
            cost_per_unit_cents: body.cost_per_unit_cents,
            from_location_id: body.from_location_id,
            to_location_id: body.to_location_id,
            reference_type: body.reference_type,
            reference_id: body.reference_id,
        })
        .await?;

    Ok(Json(movement))
}

/// Resolves the movement target to (product_id, location_id, vendor_id).
async fn resolve_target(
    state: &AppState,
    body: &RecordBody,
) -> ApiResult<(String, String, String)> {
    if let Some(inventory_id) = &body.inventory_id {
        validate_id("inventory_id", inventory_id)?;
        let record = state
            .db
            .inventory()
            .get_by_id(inventory_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Inventory not found: {inventory_id}")))?;
        return Ok((record.product_id, record.location_id, record.vendor_id));
    }

    let product_id = body
        .product_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("inventory_id or product_id is required".to_string()))?;
    let location_id = body
        .location_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("location_id is required".to_string()))?;
    validate_id("product_id", product_id)?;
    validate_id("location_id", location_id)?;

    // The owning vendor comes from the existing record; only first receiving
    // (which creates the record) needs it spelled out.
    match state.db.inventory().get_for_product(product_id, location_id).await? {
        Some(record) => Ok((record.product_id, record.location_id, record.vendor_id)),
        None => {
            let vendor_id = body.vendor_id.as_deref().ok_or_else(|| {
                ApiError::Validation(
                    "vendor_id is required when the inventory record does not exist".to_string(),
                )
            })?;
            validate_id("vendor_id", vendor_id)?;
            Ok((
                product_id.to_string(),
                location_id.to_string(),
                vendor_id.to_string(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    product_id: Option<String>,
    inventory_id: Option<String>,
    movement_type: Option<String>,
    limit: Option<i64>,
}

async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    let movement_type = query
        .movement_type
        .as_deref()
        .map(str::parse::<MovementType>)
        .transpose()
        .map_err(ApiError::from)?;

    let movements = state
        .db
        .inventory()
        .list_movements(MovementFilter {
            product_id: query.product_id,
            inventory_id: query.inventory_id,
            movement_type,
            limit: query.limit,
        })
        .await?;

    Ok(Json(movements))
}
