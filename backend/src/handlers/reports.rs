//! HTTP handlers for inventory reports

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{BranchQuery, ItemQuery, MovementReportQuery};
use crate::services::reporting::{
    CurrentStockReport, MovementReport, ReconciliationReport, ValuationReport,
};
use crate::services::{authorize_branch, Access, ReportingService};
use crate::AppState;

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(
        state.store.clone(),
        state.config.inventory.movement_report_limit,
    )
}

/// Current stock grouped by category
pub async fn get_current_stock_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<CurrentStockReport>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let report = service(&state)
        .current_stock(query.branch_id, query.category())
        .await?;
    Ok(Json(report))
}

/// Movement history with per-item totals
pub async fn get_movement_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementReportQuery>,
) -> AppResult<Json<MovementReport>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let report = service(&state)
        .movement_report(query.branch_id, query.filter())
        .await?;
    Ok(Json(report))
}

/// Quantity on hand per category
pub async fn get_valuation_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BranchQuery>,
) -> AppResult<Json<ValuationReport>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let report = service(&state).valuation(query.branch_id).await?;
    Ok(Json(report))
}

/// Stock against ledger totals
pub async fn get_reconciliation_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BranchQuery>,
) -> AppResult<Json<ReconciliationReport>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let report = service(&state).reconciliation(query.branch_id).await?;
    Ok(Json(report))
}
