//! HTTP handlers for purchase entry endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{validated, CreatePurchaseRequest, LedgerQuery, PurchaseView};
use crate::services::purchase::PurchaseOutcome;
use crate::services::{authorize_branch, Access, PurchaseService};
use crate::AppState;

/// Record a supplier delivery
pub async fn create_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseRequest>,
) -> AppResult<(StatusCode, Json<PurchaseOutcome>)> {
    let input = validated(input)?;
    authorize_branch(state.store.as_ref(), &current_user.0, input.branch_id, Access::Manage)
        .await?;

    let service = PurchaseService::new(state.store.clone(), state.config.inventory.list_limit);
    let outcome = service
        .record_purchase(input.into_command(current_user.0.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List purchases of a branch
pub async fn list_purchases(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<PurchaseView>>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;

    let service = PurchaseService::new(state.store.clone(), state.config.inventory.list_limit);
    let purchases = service.list_purchases(&query.filter()).await?;
    Ok(Json(purchases))
}
