//! Inventory item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock-keeping unit scoped to one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub branch_id: Uuid,
    /// Normalized category (trimmed, lowercase)
    pub category: String,
    pub name: String,
    pub description: String,
    /// On-hand quantity; never negative
    pub current_stock: Decimal,
    /// Reorder threshold
    pub min_quantity: Decimal,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock < self.min_quantity
    }

    /// Copy of this item's descriptive fields for another branch, with zero stock.
    ///
    /// Used when a transfer lands in a branch that has no matching item yet.
    pub fn replicate_for_branch(&self, branch_id: Uuid, now: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            branch_id,
            category: self.category.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            current_stock: Decimal::ZERO,
            min_quantity: self.min_quantity,
            unit: self.unit.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// Item with its low-stock flag, as returned by listings
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub is_low_stock: bool,
}

impl From<InventoryItem> for ItemView {
    fn from(item: InventoryItem) -> Self {
        let is_low_stock = item.is_low_stock();
        Self { item, is_low_stock }
    }
}

/// Short item reference embedded in ledger listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(stock: i64, min: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            category: "stationery".to_string(),
            name: "Notebook".to_string(),
            description: String::new(),
            current_stock: Decimal::from(stock),
            min_quantity: Decimal::from(min),
            unit: "pieces".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_is_strictly_below_minimum() {
        assert!(item(9, 10).is_low_stock());
        assert!(!item(10, 10).is_low_stock());
        assert!(!item(0, 0).is_low_stock());
    }

    #[test]
    fn test_replica_starts_empty_in_target_branch() {
        let source = item(40, 5);
        let target = Uuid::new_v4();
        let replica = source.replicate_for_branch(target, Utc::now());

        assert_ne!(replica.id, source.id);
        assert_eq!(replica.branch_id, target);
        assert_eq!(replica.current_stock, Decimal::ZERO);
        assert_eq!(replica.min_quantity, source.min_quantity);
        assert_eq!(replica.name, source.name);
        assert_eq!(replica.category, source.category);
        assert_eq!(replica.unit, source.unit);
    }

    #[test]
    fn test_item_view_serializes_flag_alongside_fields() {
        let view = ItemView::from(item(1, 3));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["is_low_stock"], true);
        assert_eq!(json["name"], "Notebook");
    }
}
