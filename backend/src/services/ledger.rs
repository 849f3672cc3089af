//! Stock-mutation service: the only writer of an item's on-hand quantity
//!
//! Every stock change goes through [`apply_mutation`], which increments the
//! item and appends exactly one ledger entry inside the caller's unit of
//! work. Either both writes commit with that unit of work or neither does.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{InventoryItem, MovementType, ReferenceType, StockMovement};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::StockTx;

/// One requested stock change
#[derive(Debug, Clone)]
pub struct StockMutation {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    /// Signed quantity added to the item's stock
    pub delta: Decimal,
    pub movement_type: MovementType,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub notes: String,
}

/// Item after the change and the ledger entry that records it
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub item: InventoryItem,
    pub movement: StockMovement,
}

/// Apply `mutation` inside `tx`.
///
/// Fails with `NotFound` when the item is missing, a validation error when it
/// belongs to another branch or the delta is zero, and `NegativeStock` when
/// the resulting stock would drop below zero. On any error the caller must
/// drop `tx` so the increment is rolled back.
pub async fn apply_mutation(
    tx: &mut dyn StockTx,
    mutation: StockMutation,
) -> AppResult<MutationOutcome> {
    if mutation.delta.is_zero() {
        return Err(AppError::validation("quantity", "Quantity must not be zero"));
    }

    let item = tx
        .increment_stock(mutation.item_id, mutation.delta)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

    if item.branch_id != mutation.branch_id {
        return Err(AppError::validation(
            "item_id",
            "Item does not belong to branch",
        ));
    }

    if item.current_stock < Decimal::ZERO {
        return Err(AppError::NegativeStock(format!(
            "item {} would have {}",
            item.id, item.current_stock
        )));
    }

    let movement = StockMovement {
        id: Uuid::new_v4(),
        branch_id: mutation.branch_id,
        item_id: mutation.item_id,
        movement_type: mutation.movement_type,
        quantity: mutation.delta,
        reference_type: mutation.reference_type,
        reference_id: mutation.reference_id,
        notes: mutation.notes,
        movement_date: Utc::now(),
    };
    tx.insert_movement(&movement).await?;

    tracing::info!(
        item_id = %item.id,
        branch_id = %item.branch_id,
        delta = %movement.quantity,
        movement_type = %movement.movement_type,
        current_stock = %item.current_stock,
        "stock mutated"
    );

    Ok(MutationOutcome { item, movement })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InventoryStore, LedgerFilter, MemoryInventoryStore};
    use shared::models::Branch;

    async fn store_with_item(stock: i64) -> (MemoryInventoryStore, InventoryItem) {
        let store = MemoryInventoryStore::new();
        let branch = Branch {
            id: Uuid::new_v4(),
            institution_id: Uuid::new_v4(),
            name: "North Campus".to_string(),
        };
        store.insert_branch(branch.clone()).await;

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            branch_id: branch.id,
            category: "stationery".to_string(),
            name: "Chalk".to_string(),
            description: String::new(),
            current_stock: Decimal::from(stock),
            min_quantity: Decimal::ZERO,
            unit: "boxes".to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_item(&item).await.unwrap();
        tx.commit().await.unwrap();
        (store, item)
    }

    fn mutation(item: &InventoryItem, delta: i64) -> StockMutation {
        StockMutation {
            branch_id: item.branch_id,
            item_id: item.id,
            delta: Decimal::from(delta),
            movement_type: MovementType::Adjustment,
            reference_type: ReferenceType::StockAdjustment,
            reference_id: Uuid::new_v4(),
            notes: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mutation_increments_stock_and_appends_movement() {
        let (store, item) = store_with_item(50).await;

        let mut tx = store.begin().await.unwrap();
        let outcome = apply_mutation(tx.as_mut(), mutation(&item, 20)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.item.current_stock, Decimal::from(70));
        assert_eq!(outcome.movement.quantity, Decimal::from(20));

        let movements = store
            .list_movements(&LedgerFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_result_is_rejected_without_movement() {
        let (store, item) = store_with_item(10).await;

        let mut tx = store.begin().await.unwrap();
        let err = apply_mutation(tx.as_mut(), mutation(&item, -11)).await.unwrap_err();
        drop(tx);

        assert!(matches!(err, AppError::NegativeStock(_)));
        let stored = store.find_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, Decimal::from(10));
        assert!(store
            .list_movements(&LedgerFilter::default(), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let (store, item) = store_with_item(10).await;
        let mut missing = mutation(&item, 5);
        missing.item_id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        let err = apply_mutation(tx.as_mut(), missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_item_from_other_branch_is_rejected() {
        let (store, item) = store_with_item(10).await;
        let mut foreign = mutation(&item, 5);
        foreign.branch_id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        let err = apply_mutation(tx.as_mut(), foreign).await.unwrap_err();
        drop(tx);

        assert!(matches!(err, AppError::Validation { .. }));
        let stored = store.find_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_overflowing_delta_is_rejected_without_panic() {
        let (store, item) = store_with_item(10).await;
        let mut overflowing = mutation(&item, 1);
        overflowing.delta = Decimal::MAX;

        let mut tx = store.begin().await.unwrap();
        let err = apply_mutation(tx.as_mut(), overflowing).await.unwrap_err();
        drop(tx);

        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "quantity"),
            other => panic!("unexpected error: {other:?}"),
        }
        let stored = store.find_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_zero_delta_is_rejected() {
        let (store, item) = store_with_item(10).await;
        let mut tx = store.begin().await.unwrap();
        let err = apply_mutation(tx.as_mut(), mutation(&item, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
