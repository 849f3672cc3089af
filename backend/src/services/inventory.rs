//! Inventory item service: the item records whose stock the ledger mutates

use chrono::Utc;
use rust_decimal::Decimal;
use shared::models::{InventoryItem, ItemView};
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::store::{DynInventoryStore, ItemFilter};

/// Inventory service for managing item records
#[derive(Clone)]
pub struct InventoryService {
    store: DynInventoryStore,
    config: InventoryConfig,
}

/// Validated command for creating an item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub branch_id: Uuid,
    /// Already normalized
    pub category: String,
    pub name: String,
    pub description: String,
    pub min_quantity: Decimal,
    pub unit: Option<String>,
}

/// Validated partial update of an item's descriptive fields
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_quantity: Option<Decimal>,
    pub unit: Option<String>,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(store: DynInventoryStore, config: InventoryConfig) -> Self {
        Self { store, config }
    }

    /// Create an item with zero stock
    pub async fn create_item(&self, input: NewItem) -> AppResult<InventoryItem> {
        let mut tx = self.store.begin().await?;

        if tx.find_branch(input.branch_id).await?.is_none() {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            branch_id: input.branch_id,
            category: input.category,
            name: input.name,
            description: input.description,
            current_stock: Decimal::ZERO,
            min_quantity: input.min_quantity,
            unit: input.unit.unwrap_or_else(|| self.config.default_unit.clone()),
            created_at: now,
            updated_at: now,
        };

        tx.insert_item(&item).await?;
        tx.commit().await?;

        tracing::info!(item_id = %item.id, branch_id = %item.branch_id, "inventory item created");
        Ok(item)
    }

    /// Update descriptive fields; stock is only changed through the ledger
    pub async fn update_item(&self, item_id: Uuid, patch: ItemPatch) -> AppResult<InventoryItem> {
        let mut tx = self.store.begin().await?;

        let mut item = tx
            .find_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(min_quantity) = patch.min_quantity {
            item.min_quantity = min_quantity;
        }
        if let Some(unit) = patch.unit {
            item.unit = unit;
        }
        item.updated_at = Utc::now();

        tx.update_item_details(&item).await?;
        tx.commit().await?;

        Ok(item)
    }

    /// Get one item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<ItemView> {
        self.store
            .find_item(item_id)
            .await?
            .map(ItemView::from)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    /// List a branch's items sorted by category then name
    pub async fn list_items(
        &self,
        branch_id: Uuid,
        category: Option<String>,
    ) -> AppResult<Vec<ItemView>> {
        let items = self
            .store
            .list_items(&ItemFilter {
                branch_id,
                category,
                low_stock_only: false,
            })
            .await?;

        Ok(items.into_iter().map(ItemView::from).collect())
    }

    /// Items whose stock is below their reorder threshold
    pub async fn low_stock_items(&self, branch_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        self.store
            .list_items(&ItemFilter {
                branch_id,
                category: None,
                low_stock_only: true,
            })
            .await
    }
}
