//! HTTP handlers for stock transfer endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{validated, CreateTransferRequest, StockTransfer, TransferQuery, TransferView};
use crate::services::transfer::TransferOutcome;
use crate::services::{authorize_branch, Access, TransferService};
use crate::store::TransferFilter;
use crate::AppState;

fn service(state: &AppState) -> TransferService {
    TransferService::new(state.store.clone(), state.config.inventory.list_limit)
}

/// Request a transfer out of a branch
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferRequest>,
) -> AppResult<(StatusCode, Json<StockTransfer>)> {
    let input = validated(input)?;
    authorize_branch(
        state.store.as_ref(),
        &current_user.0,
        input.from_branch_id,
        Access::Manage,
    )
    .await?;

    let transfer = service(&state)
        .request_transfer(input.into_command(current_user.0.user_id)?)
        .await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

/// List transfers into or out of a branch
pub async fn list_transfers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TransferQuery>,
) -> AppResult<Json<Vec<TransferView>>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;

    let transfers = service(&state)
        .list_transfers(&TransferFilter {
            branch_id: query.branch_id,
            status: query.status,
        })
        .await?;
    Ok(Json(transfers))
}

/// Get a transfer visible from either of its branches
pub async fn get_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferView>> {
    let view = service(&state).get_transfer(transfer_id).await?;
    let store = state.store.as_ref();
    let transfer = &view.transfer;

    match authorize_branch(store, &current_user.0, transfer.from_branch_id, Access::Read).await {
        Err(AppError::InsufficientPermissions) => {
            authorize_branch(store, &current_user.0, transfer.to_branch_id, Access::Read).await?;
        }
        other => {
            other?;
        }
    }

    Ok(Json(view))
}

/// Approve a pending transfer, moving the stock
pub async fn approve_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferOutcome>> {
    let service = service(&state);
    let view = service.get_transfer(transfer_id).await?;
    authorize_branch(
        state.store.as_ref(),
        &current_user.0,
        view.transfer.from_branch_id,
        Access::Manage,
    )
    .await?;

    let outcome = service
        .approve_transfer(transfer_id, current_user.0.user_id)
        .await?;
    Ok(Json(outcome))
}

/// Reject a pending transfer
pub async fn reject_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<StockTransfer>> {
    let service = service(&state);
    let view = service.get_transfer(transfer_id).await?;
    authorize_branch(
        state.store.as_ref(),
        &current_user.0,
        view.transfer.from_branch_id,
        Access::Manage,
    )
    .await?;

    let transfer = service
        .reject_transfer(transfer_id, current_user.0.user_id)
        .await?;
    Ok(Json(transfer))
}
