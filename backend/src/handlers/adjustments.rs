//! HTTP handlers for stock adjustment and opening-stock endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{
    validated, AdjustmentView, CreateAdjustmentRequest, LedgerQuery, OpeningStockRequest,
};
use crate::services::adjustment::{AdjustmentOutcome, OpeningStockResult};
use crate::services::{authorize_branch, Access, AdjustmentService};
use crate::AppState;

fn service(state: &AppState) -> AdjustmentService {
    AdjustmentService::new(state.store.clone(), state.config.inventory.list_limit)
}

/// Record a manual stock correction
pub async fn create_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAdjustmentRequest>,
) -> AppResult<(StatusCode, Json<AdjustmentOutcome>)> {
    let input = validated(input)?;
    authorize_branch(state.store.as_ref(), &current_user.0, input.branch_id, Access::Manage)
        .await?;

    let outcome = service(&state)
        .record_adjustment(input.into_command(current_user.0.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List adjustments of a branch
pub async fn list_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<AdjustmentView>>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let adjustments = service(&state).list_adjustments(&query.filter()).await?;
    Ok(Json(adjustments))
}

/// Set opening stock for a batch of items
pub async fn create_opening_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OpeningStockRequest>,
) -> AppResult<Json<OpeningStockResult>> {
    let input = validated(input)?;
    authorize_branch(state.store.as_ref(), &current_user.0, input.branch_id, Access::Manage)
        .await?;

    let result = service(&state)
        .apply_opening_stock(input.into_command(current_user.0.user_id))
        .await?;
    Ok(Json(result))
}
