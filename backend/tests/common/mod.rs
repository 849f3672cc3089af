//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use school_inventory::config::InventoryConfig;
use school_inventory::services::adjustment::{AdjustmentService, OpeningStock, OpeningStockLine};
use school_inventory::services::inventory::{InventoryService, NewItem};
use school_inventory::store::{DynInventoryStore, MemoryInventoryStore};
use shared::models::{Branch, InventoryItem};
use uuid::Uuid;

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Two sibling branches plus one branch of another institution
pub struct Fixture {
    pub memory: Arc<MemoryInventoryStore>,
    pub store: DynInventoryStore,
    pub north: Branch,
    pub south: Branch,
    pub foreign: Branch,
    pub actor: Uuid,
}

pub async fn fixture() -> Fixture {
    let memory = Arc::new(MemoryInventoryStore::new());
    let institution_id = Uuid::new_v4();

    let branch = |name: &str, institution_id: Uuid| Branch {
        id: Uuid::new_v4(),
        institution_id,
        name: name.to_string(),
    };
    let north = branch("North Campus", institution_id);
    let south = branch("South Campus", institution_id);
    let foreign = branch("Riverside Academy", Uuid::new_v4());

    for b in [&north, &south, &foreign] {
        memory.insert_branch(b.clone()).await;
    }

    Fixture {
        store: memory.clone(),
        memory,
        north,
        south,
        foreign,
        actor: Uuid::new_v4(),
    }
}

impl Fixture {
    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.store.clone(), InventoryConfig::default())
    }

    pub fn adjustments(&self) -> AdjustmentService {
        AdjustmentService::new(self.store.clone(), 100)
    }

    /// Create an item and bring it to `stock` through an opening-stock entry
    pub async fn item(&self, branch_id: Uuid, name: &str, stock: i64) -> InventoryItem {
        let item = self
            .inventory()
            .create_item(NewItem {
                branch_id,
                category: "stationery".to_string(),
                name: name.to_string(),
                description: format!("{name} for classrooms"),
                min_quantity: dec(10),
                unit: Some("boxes".to_string()),
            })
            .await
            .unwrap();

        if stock > 0 {
            self.adjustments()
                .apply_opening_stock(OpeningStock {
                    branch_id,
                    lines: vec![OpeningStockLine {
                        item_id: item.id,
                        quantity: dec(stock),
                    }],
                    adjusted_by: self.actor,
                })
                .await
                .unwrap();
        }

        self.stock_of(item.id).await
    }

    pub async fn stock_of(&self, item_id: Uuid) -> InventoryItem {
        self.store.find_item(item_id).await.unwrap().unwrap()
    }
}
