//! Route definitions for the school inventory service

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes(state))
}

/// Inventory routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/items/low-stock", get(handlers::list_low_stock_items))
        .route(
            "/items/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        .route(
            "/purchases",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route(
            "/transfers",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/transfers/:transfer_id", get(handlers::get_transfer))
        .route(
            "/transfers/:transfer_id/approve",
            put(handlers::approve_transfer),
        )
        .route(
            "/transfers/:transfer_id/reject",
            put(handlers::reject_transfer),
        )
        .route(
            "/adjustments",
            get(handlers::list_adjustments).post(handlers::create_adjustment),
        )
        .route("/opening-stock", post(handlers::create_opening_stock))
        .nest("/reports", report_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/current-stock", get(handlers::get_current_stock_report))
        .route("/movement", get(handlers::get_movement_report))
        .route("/valuation", get(handlers::get_valuation_report))
        .route(
            "/reconciliation",
            get(handlers::get_reconciliation_report),
        )
}
