//! Storage seam for the inventory ledger
//!
//! [`InventoryStore`] serves reads and opens units of work. A [`StockTx`] is
//! one open unit of work: its writes become visible together on
//! [`StockTx::commit`], and dropping it without committing discards them.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Branch, InventoryItem, PurchaseEntry, StockAdjustment, StockMovement, StockTransfer,
    TransferStatus,
};
use shared::types::TimeWindow;
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

/// Shared handle to the configured store
pub type DynInventoryStore = Arc<dyn InventoryStore>;

/// Item listing filter
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub branch_id: Uuid,
    pub category: Option<String>,
    pub low_stock_only: bool,
}

/// Filter shared by purchase, adjustment and movement listings
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub branch_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub window: TimeWindow,
}

/// Transfer listing filter: transfers where the branch is either side
#[derive(Debug, Clone)]
pub struct TransferFilter {
    pub branch_id: Uuid,
    pub status: Option<TransferStatus>,
}

/// Read access and unit-of-work factory
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Open a unit of work
    async fn begin(&self) -> AppResult<Box<dyn StockTx>>;

    /// Check that the backing storage is reachable
    async fn ping(&self) -> AppResult<()>;

    async fn find_branch(&self, branch_id: Uuid) -> AppResult<Option<Branch>>;

    async fn find_item(&self, item_id: Uuid) -> AppResult<Option<InventoryItem>>;

    /// Items sorted by category then name
    async fn list_items(&self, filter: &ItemFilter) -> AppResult<Vec<InventoryItem>>;

    async fn items_by_ids(&self, item_ids: &[Uuid]) -> AppResult<Vec<InventoryItem>>;

    /// Newest first
    async fn list_purchases(&self, filter: &LedgerFilter, limit: i64)
        -> AppResult<Vec<PurchaseEntry>>;

    /// Newest first
    async fn list_adjustments(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>>;

    /// Newest first
    async fn list_movements(&self, filter: &LedgerFilter, limit: i64)
        -> AppResult<Vec<StockMovement>>;

    /// Newest first
    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        limit: i64,
    ) -> AppResult<Vec<StockTransfer>>;

    async fn find_transfer(&self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>>;

    /// Sum of signed movement deltas per item, for every item of the branch
    /// that has at least one movement
    async fn ledger_totals(&self, branch_id: Uuid) -> AppResult<Vec<(Uuid, Decimal)>>;
}

/// One open unit of work.
///
/// Reads through a unit of work lock what they read until it ends.
#[async_trait]
pub trait StockTx: Send {
    async fn find_branch(&mut self, branch_id: Uuid) -> AppResult<Option<Branch>>;

    async fn find_item(&mut self, item_id: Uuid) -> AppResult<Option<InventoryItem>>;

    async fn find_item_by_name(
        &mut self,
        branch_id: Uuid,
        name: &str,
        category: &str,
    ) -> AppResult<Option<InventoryItem>>;

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()>;

    /// Insert `item` unless its branch already holds an item with the same
    /// name and category. Returns the locked stored item and whether it was
    /// created. Safe against a concurrent unit of work creating the same item.
    async fn find_or_insert_item(
        &mut self,
        item: &InventoryItem,
    ) -> AppResult<(InventoryItem, bool)>;

    /// Write name, description, min quantity and unit; never stock
    async fn update_item_details(&mut self, item: &InventoryItem) -> AppResult<()>;

    /// Add `delta` to the item's stock and return the updated item,
    /// or `None` when the item does not exist
    async fn increment_stock(
        &mut self,
        item_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Option<InventoryItem>>;

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()>;

    async fn insert_purchase(&mut self, purchase: &PurchaseEntry) -> AppResult<()>;

    async fn insert_adjustment(&mut self, adjustment: &StockAdjustment) -> AppResult<()>;

    async fn insert_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()>;

    async fn find_transfer(&mut self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>>;

    async fn update_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()>;

    /// Make every write of this unit of work visible
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
