//! In-process inventory store.
//!
//! Intended for tests and local demos. One async mutex guards all state; a
//! unit of work holds it from `begin` until it commits or drops, so units of
//! work are fully serialized. Writes go to a working copy that replaces the
//! shared state on commit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Branch, InventoryItem, PurchaseEntry, StockAdjustment, StockMovement, StockTransfer,
};
use shared::validation::{checked_total, validate_resulting_stock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{InventoryStore, ItemFilter, LedgerFilter, StockTx, TransferFilter};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    branches: HashMap<Uuid, Branch>,
    items: HashMap<Uuid, InventoryItem>,
    movements: Vec<StockMovement>,
    purchases: Vec<PurchaseEntry>,
    adjustments: Vec<StockAdjustment>,
    transfers: Vec<StockTransfer>,
}

impl MemoryState {
    fn has_duplicate_item(&self, candidate: &InventoryItem) -> bool {
        self.items.values().any(|existing| {
            existing.id != candidate.id
                && existing.branch_id == candidate.branch_id
                && existing.name == candidate.name
                && existing.category == candidate.category
        })
    }
}

/// In-process [`InventoryStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryInventoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a branch; branches are owned by the wider application
    pub async fn insert_branch(&self, branch: Branch) {
        self.state.lock().await.branches.insert(branch.id, branch);
    }

    /// Make the next commit fail as a storage error would, discarding its writes
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

/// Newest first; entries with equal dates keep reverse insertion order
fn newest_first<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    date: impl Fn(&T) -> DateTime<Utc>,
    limit: i64,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().filter(|r| keep(r)).cloned().collect();
    out.sort_by(|a, b| date(b).cmp(&date(a)));
    out.truncate(usize::try_from(limit).unwrap_or(0));
    out
}

fn ledger_match(filter: &LedgerFilter, branch_id: Uuid, item_id: Uuid, at: DateTime<Utc>) -> bool {
    filter.branch_id.map_or(true, |b| b == branch_id)
        && filter.item_id.map_or(true, |i| i == item_id)
        && filter.window.contains(at)
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StockTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryStockTx {
            guard,
            working,
            fail_next_commit: self.fail_next_commit.clone(),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_branch(&self, branch_id: Uuid) -> AppResult<Option<Branch>> {
        Ok(self.state.lock().await.branches.get(&branch_id).cloned())
    }

    async fn find_item(&self, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        Ok(self.state.lock().await.items.get(&item_id).cloned())
    }

    async fn list_items(&self, filter: &ItemFilter) -> AppResult<Vec<InventoryItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| item.branch_id == filter.branch_id)
            .filter(|item| filter.category.as_ref().map_or(true, |c| &item.category == c))
            .filter(|item| !filter.low_stock_only || item.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(items)
    }

    async fn items_by_ids(&self, item_ids: &[Uuid]) -> AppResult<Vec<InventoryItem>> {
        let state = self.state.lock().await;
        Ok(item_ids
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }

    async fn list_purchases(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<PurchaseEntry>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            &state.purchases,
            |p| ledger_match(filter, p.branch_id, p.item_id, p.purchase_date),
            |p| p.purchase_date,
            limit,
        ))
    }

    async fn list_adjustments(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            &state.adjustments,
            |a| ledger_match(filter, a.branch_id, a.item_id, a.adjustment_date),
            |a| a.adjustment_date,
            limit,
        ))
    }

    async fn list_movements(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<StockMovement>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            &state.movements,
            |m| ledger_match(filter, m.branch_id, m.item_id, m.movement_date),
            |m| m.movement_date,
            limit,
        ))
    }

    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        limit: i64,
    ) -> AppResult<Vec<StockTransfer>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            &state.transfers,
            |t| {
                t.involves_branch(filter.branch_id)
                    && filter.status.map_or(true, |s| t.status == s)
            },
            |t| t.request_date,
            limit,
        ))
    }

    async fn find_transfer(&self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>> {
        let state = self.state.lock().await;
        Ok(state.transfers.iter().find(|t| t.id == transfer_id).cloned())
    }

    async fn ledger_totals(&self, branch_id: Uuid) -> AppResult<Vec<(Uuid, Decimal)>> {
        let state = self.state.lock().await;
        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for movement in state.movements.iter().filter(|m| m.branch_id == branch_id) {
            let total = totals.entry(movement.item_id).or_default();
            *total = checked_total([*total, movement.quantity])?;
        }
        Ok(totals.into_iter().collect())
    }
}

/// Unit of work over [`MemoryInventoryStore`]
pub struct MemoryStockTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_next_commit: Arc<AtomicBool>,
}

#[async_trait]
impl StockTx for MemoryStockTx {
    async fn find_branch(&mut self, branch_id: Uuid) -> AppResult<Option<Branch>> {
        Ok(self.working.branches.get(&branch_id).cloned())
    }

    async fn find_item(&mut self, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        Ok(self.working.items.get(&item_id).cloned())
    }

    async fn find_item_by_name(
        &mut self,
        branch_id: Uuid,
        name: &str,
        category: &str,
    ) -> AppResult<Option<InventoryItem>> {
        Ok(self
            .working
            .items
            .values()
            .find(|i| i.branch_id == branch_id && i.name == name && i.category == category)
            .cloned())
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        if self.working.has_duplicate_item(item) {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        self.working.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_or_insert_item(
        &mut self,
        item: &InventoryItem,
    ) -> AppResult<(InventoryItem, bool)> {
        if let Some(existing) = self
            .find_item_by_name(item.branch_id, &item.name, &item.category)
            .await?
        {
            return Ok((existing, false));
        }
        self.working.items.insert(item.id, item.clone());
        Ok((item.clone(), true))
    }

    async fn update_item_details(&mut self, item: &InventoryItem) -> AppResult<()> {
        if self.working.has_duplicate_item(item) {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        let existing = self
            .working
            .items
            .get_mut(&item.id)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;
        existing.name = item.name.clone();
        existing.description = item.description.clone();
        existing.min_quantity = item.min_quantity;
        existing.unit = item.unit.clone();
        existing.updated_at = item.updated_at;
        Ok(())
    }

    async fn increment_stock(
        &mut self,
        item_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Option<InventoryItem>> {
        let Some(item) = self.working.items.get_mut(&item_id) else {
            return Ok(None);
        };

        // Mirrors the non-negative stock check constraint
        item.current_stock = validate_resulting_stock(item.current_stock, delta)?;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn insert_purchase(&mut self, purchase: &PurchaseEntry) -> AppResult<()> {
        self.working.purchases.push(purchase.clone());
        Ok(())
    }

    async fn insert_adjustment(&mut self, adjustment: &StockAdjustment) -> AppResult<()> {
        self.working.adjustments.push(adjustment.clone());
        Ok(())
    }

    async fn insert_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()> {
        self.working.transfers.push(transfer.clone());
        Ok(())
    }

    async fn find_transfer(&mut self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>> {
        Ok(self
            .working
            .transfers
            .iter()
            .find(|t| t.id == transfer_id)
            .cloned())
    }

    async fn update_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()> {
        let existing = self
            .working
            .transfers
            .iter_mut()
            .find(|t| t.id == transfer.id)
            .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;
        *existing = transfer.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryStockTx {
            mut guard,
            working,
            fail_next_commit,
        } = *self;

        if fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(
                "injected commit failure".to_string(),
            )));
        }

        *guard = working;
        Ok(())
    }
}
