//! HTTP handlers for inventory item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{
    validated, BranchQuery, CreateItemRequest, InventoryItem, ItemQuery, ItemView,
    UpdateItemRequest,
};
use crate::services::{authorize_branch, Access, InventoryService};
use crate::AppState;

fn service(state: &AppState) -> InventoryService {
    InventoryService::new(state.store.clone(), state.config.inventory.clone())
}

/// List a branch's items
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<Vec<ItemView>>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let items = service(&state)
        .list_items(query.branch_id, query.category())
        .await?;
    Ok(Json(items))
}

/// Create an item with zero stock
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let input = validated(input)?;
    authorize_branch(state.store.as_ref(), &current_user.0, input.branch_id, Access::Manage)
        .await?;
    let item = service(&state).create_item(input.into_command()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Items below their reorder threshold
pub async fn list_low_stock_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BranchQuery>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    authorize_branch(state.store.as_ref(), &current_user.0, query.branch_id, Access::Read).await?;
    let items = service(&state).low_stock_items(query.branch_id).await?;
    Ok(Json(items))
}

/// Get one item
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemView>> {
    let view = service(&state).get_item(item_id).await?;
    authorize_branch(
        state.store.as_ref(),
        &current_user.0,
        view.item.branch_id,
        Access::Read,
    )
    .await?;
    Ok(Json(view))
}

/// Update an item's descriptive fields
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemRequest>,
) -> AppResult<Json<InventoryItem>> {
    let input = validated(input)?;
    let service = service(&state);
    let existing = service.get_item(item_id).await?;
    authorize_branch(
        state.store.as_ref(),
        &current_user.0,
        existing.item.branch_id,
        Access::Manage,
    )
    .await?;
    let item = service.update_item(item_id, input.into_patch()).await?;
    Ok(Json(item))
}
