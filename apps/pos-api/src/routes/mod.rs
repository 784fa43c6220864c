//! # HTTP Routes
//!
//! One router per resource, merged into the app router.
//!
//! ## Surface
//! ```text
//! GET  /health                       liveness + migration status
//! GET  /registers?location_id=       list terminals at a location
//! GET  /registers/{id}               fetch one terminal
//! POST /registers                    provision a terminal (store setup)
//! POST /registers/{id}/deactivate    retire a terminal
//! POST /sessions/get-or-create       open or rejoin the drawer session
//! GET  /sessions/{id}                fetch a session
//! POST /sessions/{id}/increment      atomic counter increment
//! POST /sessions/{id}/end            close the drawer
//! POST /stock-movements              record an inventory movement
//! GET  /stock-movements              movement audit trail
//! POST /sales                        transactional checkout
//! GET  /sales/{id}                   sale with line items
//! POST /sales/{id}/void              void with compensating movements
//! ```

pub mod health;
pub mod movement;
pub mod register;
pub mod sale;
pub mod session;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router with all resource routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(register::router())
        .merge(session::router())
        .merge(movement::router())
        .merge(sale::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Route-Level Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use verdant_db::{Database, DbConfig};

    async fn test_app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            max_connections: 1,
            expose_internal_errors: false,
        };
        app_router(AppState::new(db, config))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = send(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["migrations_applied"], body["migrations_total"]);
    }

    #[tokio::test]
    async fn test_missing_register_gets_error_envelope() {
        let app = test_app().await;
        let (status, body) = send(&app, get("/registers/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_session_lifecycle_over_http() {
        let app = test_app().await;

        let (status, register) = send(
            &app,
            post_json(
                "/registers",
                json!({"location_id": "loc-1", "vendor_id": "vendor-1", "name": "Front Counter 1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let register_id = register["id"].as_str().unwrap().to_string();

        let open_body = json!({
            "register_id": register_id,
            "location_id": "loc-1",
            "vendor_id": "vendor-1",
            "user_id": "op-1",
        });
        let (status, session) =
            send(&app, post_json("/sessions/get-or-create", open_body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["status"], "open");
        let session_id = session["id"].as_str().unwrap().to_string();

        // Same register, same session back.
        let (_, again) = send(&app, post_json("/sessions/get-or-create", open_body)).await;
        assert_eq!(again["id"], session_id.as_str());

        let (status, updated) = send(
            &app,
            post_json(
                &format!("/sessions/{session_id}/increment"),
                json!({"counter_name": "total_cash", "amount": 2500}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["total_cash_cents"], 2500);
        assert_eq!(updated["total_sales_cents"], 2500);
        assert_eq!(updated["total_transactions"], 1);

        let (status, closed) = send(
            &app,
            post_json(&format!("/sessions/{session_id}/end"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["status"], "closed");

        // Closed sessions reject further increments with 409.
        let (status, body) = send(
            &app,
            post_json(
                &format!("/sessions/{session_id}/increment"),
                json!({"counter_name": "total_cash", "amount": 100}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_counter_is_validation_error() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/sessions/s1/increment",
                json!({"counter_name": "refund_total", "amount": 100}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_movement_type_is_conflict() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "product_id": "prod-1",
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "movement_type": "restock",
                    "quantity": 5,
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("restock"));
    }

    /// Movements can address the record by inventory_id once it exists;
    /// product/location/vendor are resolved from the record.
    #[tokio::test]
    async fn test_movement_addressed_by_inventory_id() {
        let app = test_app().await;

        let (status, receiving) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "product_id": "prod-1",
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "movement_type": "purchase",
                    "quantity": 10,
                    "cost_per_unit_cents": 200,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let inventory_id = receiving["inventory_id"].as_str().unwrap();

        let (status, movement) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "inventory_id": inventory_id,
                    "product_id": "prod-1",
                    "movement_type": "purchase",
                    "quantity": 20,
                    "cost_per_unit_cents": 300,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(movement["inventory_id"], inventory_id);
        assert_eq!(movement["quantity_after"], 30);
    }

    #[tokio::test]
    async fn test_movement_for_unknown_inventory_id() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "inventory_id": "nope",
                    "movement_type": "purchase",
                    "quantity": 1,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    /// Malformed request bodies get the error envelope, not a bare
    /// extractor rejection.
    #[tokio::test]
    async fn test_malformed_body_gets_error_envelope() {
        let app = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/stock-movements")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_over_deduction_is_conflict() {
        let app = test_app().await;

        let (status, _) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "product_id": "prod-1",
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "movement_type": "purchase",
                    "quantity": 5,
                    "cost_per_unit_cents": 200,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "product_id": "prod-1",
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "movement_type": "pos_sale",
                    "quantity": 8,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));
    }

    #[tokio::test]
    async fn test_checkout_overflowing_line_total_is_validation_error() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/sales",
                json!({
                    "session_id": "s1",
                    "user_id": "op-1",
                    "channel": "walk_in",
                    "tender": "cash",
                    "items": [
                        {"product_id": "prod-1", "name": "P", "quantity": 2, "unit_price_cents": i64::MAX}
                    ],
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("overflows"));
    }

    #[tokio::test]
    async fn test_checkout_over_http() {
        let app = test_app().await;

        let (_, register) = send(
            &app,
            post_json(
                "/registers",
                json!({"location_id": "loc-1", "vendor_id": "vendor-1", "name": "Front Counter 1"}),
            ),
        )
        .await;
        let register_id = register["id"].as_str().unwrap();

        let (_, session) = send(
            &app,
            post_json(
                "/sessions/get-or-create",
                json!({
                    "register_id": register_id,
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "user_id": "op-1",
                }),
            ),
        )
        .await;
        let session_id = session["id"].as_str().unwrap();

        send(
            &app,
            post_json(
                "/stock-movements",
                json!({
                    "product_id": "prod-1",
                    "location_id": "loc-1",
                    "vendor_id": "vendor-1",
                    "movement_type": "purchase",
                    "quantity": 10,
                    "cost_per_unit_cents": 200,
                }),
            ),
        )
        .await;

        let (status, sale) = send(
            &app,
            post_json(
                "/sales",
                json!({
                    "session_id": session_id,
                    "user_id": "op-1",
                    "channel": "walk_in",
                    "tender": "cash",
                    "items": [
                        {"product_id": "prod-1", "name": "Blue Dream 3.5g", "quantity": 2, "unit_price_cents": 4500}
                    ],
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sale["status"], "completed");
        assert_eq!(sale["total_cents"], 9000);
        assert_eq!(sale["items"].as_array().unwrap().len(), 1);

        // Void restocks and flips status.
        let sale_id = sale["id"].as_str().unwrap();
        let (status, voided) =
            send(&app, post_json(&format!("/sales/{sale_id}/void"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(voided["status"], "voided");
    }
}
