//! Sale endpoints: transactional checkout and voids.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use verdant_core::validation::{validate_id, validate_non_negative_cents, validate_quantity};
use verdant_core::{Money, Sale, SaleChannel, SaleItem, TenderType, MAX_SALE_ITEMS};
use verdant_db::{CheckoutRequest, NewSaleItem};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", post(checkout))
        .route("/sales/{id}", get(get_sale))
        .route("/sales/{id}/void", post(void_sale))
}

#[derive(Debug, Deserialize)]
struct CheckoutItemBody {
    product_id: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
}

#[derive(Debug, Deserialize)]
struct CheckoutBody {
    session_id: String,
    user_id: String,
    channel: SaleChannel,
    tender: TenderType,
    items: Vec<CheckoutItemBody>,
}

/// A sale with its line items, as returned to the terminal.
#[derive(Debug, Serialize)]
struct SaleResponse {
    #[serde(flatten)]
    sale: Sale,
    items: Vec<SaleItem>,
}

async fn checkout(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> ApiResult<Json<SaleResponse>> {
    validate_id("session_id", &body.session_id)?;
    validate_id("user_id", &body.user_id)?;

    if body.items.is_empty() {
        return Err(ApiError::Validation("items must not be empty".to_string()));
    }
    if body.items.len() > MAX_SALE_ITEMS {
        return Err(ApiError::Validation(format!(
            "sale cannot have more than {MAX_SALE_ITEMS} items"
        )));
    }
    let mut subtotal = Money::zero();
    for item in &body.items {
        validate_id("product_id", &item.product_id)?;
        validate_id("name", &item.name)?;
        validate_quantity(item.quantity)?;
        validate_non_negative_cents("unit_price_cents", item.unit_price_cents)?;

        // Unit prices are unbounded on the wire; reject totals that do not
        // fit in i64 cents before they reach the ledger.
        let line_total = Money::from_cents(item.unit_price_cents)
            .checked_mul(item.quantity)
            .ok_or_else(|| {
                ApiError::Validation(format!(
                    "line total overflows for product {}",
                    item.product_id
                ))
            })?;
        subtotal = subtotal.checked_add(line_total).ok_or_else(|| {
            ApiError::Validation("sale total overflows".to_string())
        })?;
    }

    let sale = state
        .db
        .sales()
        .checkout(CheckoutRequest {
            session_id: body.session_id,
            operator_id: body.user_id,
            channel: body.channel,
            tender: body.tender,
            items: body
                .items
                .into_iter()
                .map(|item| NewSaleItem {
                    product_id: item.product_id,
                    name: item.name,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                })
                .collect(),
        })
        .await?;

    let (sale, items) = state
        .db
        .sales()
        .get_with_items(&sale.id)
        .await?
        .ok_or_else(|| ApiError::Storage("sale vanished after checkout".to_string()))?;

    Ok(Json(SaleResponse { sale, items }))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleResponse>> {
    let (sale, items) = state
        .db
        .sales()
        .get_with_items(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sale not found: {id}")))?;

    Ok(Json(SaleResponse { sale, items }))
}

async fn void_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    let sale = state.db.sales().void_sale(&id).await?;
    Ok(Json(sale))
}
