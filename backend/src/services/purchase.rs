//! Purchase entry service: supplier deliveries that increase stock

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    InventoryItem, MovementType, PurchaseEntry, PurchaseView, ReferenceType, StockMovement,
};
use shared::validation::validate_positive_quantity;
use uuid::Uuid;

use super::item_summaries;
use super::ledger::{apply_mutation, StockMutation};
use crate::error::{AppError, AppResult};
use crate::store::{DynInventoryStore, LedgerFilter};

/// Purchase service for recording supplier deliveries
#[derive(Clone)]
pub struct PurchaseService {
    store: DynInventoryStore,
    list_limit: i64,
}

/// Validated command for recording a purchase
#[derive(Debug, Clone)]
pub struct RecordPurchase {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub supplier_name: String,
    pub invoice_number: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_by: Uuid,
}

/// Recorded purchase with the stock change it caused
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    #[serde(flatten)]
    pub purchase: PurchaseEntry,
    pub item: InventoryItem,
    pub movement: StockMovement,
}

impl PurchaseService {
    pub fn new(store: DynInventoryStore, list_limit: i64) -> Self {
        Self { store, list_limit }
    }

    /// Record a purchase and credit its quantity in one unit of work
    pub async fn record_purchase(&self, input: RecordPurchase) -> AppResult<PurchaseOutcome> {
        validate_positive_quantity(input.quantity)
            .map_err(|message| AppError::validation("quantity", message))?;

        let mut tx = self.store.begin().await?;

        let belongs = tx
            .find_item(input.item_id)
            .await?
            .is_some_and(|item| item.branch_id == input.branch_id);
        if !belongs {
            return Err(AppError::validation(
                "item_id",
                "Item not found or does not belong to branch",
            ));
        }

        let now = Utc::now();
        let purchase = PurchaseEntry {
            id: Uuid::new_v4(),
            branch_id: input.branch_id,
            item_id: input.item_id,
            quantity: input.quantity,
            supplier_name: input.supplier_name,
            invoice_number: input.invoice_number,
            purchase_date: input.purchase_date.unwrap_or(now),
            notes: input.notes,
            created_by: input.created_by,
            created_at: now,
        };
        tx.insert_purchase(&purchase).await?;

        let outcome = apply_mutation(
            tx.as_mut(),
            StockMutation {
                branch_id: purchase.branch_id,
                item_id: purchase.item_id,
                delta: purchase.quantity,
                movement_type: MovementType::Purchase,
                reference_type: ReferenceType::PurchaseEntry,
                reference_id: purchase.id,
                notes: purchase.movement_note(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_id = %purchase.id,
            supplier = %purchase.supplier_name,
            "purchase recorded"
        );

        Ok(PurchaseOutcome {
            purchase,
            item: outcome.item,
            movement: outcome.movement,
        })
    }

    /// List purchases, newest first
    pub async fn list_purchases(&self, filter: &LedgerFilter) -> AppResult<Vec<PurchaseView>> {
        let purchases = self.store.list_purchases(filter, self.list_limit).await?;
        let summaries =
            item_summaries(self.store.as_ref(), purchases.iter().map(|p| p.item_id)).await?;

        Ok(purchases
            .into_iter()
            .map(|purchase| PurchaseView {
                item: summaries.get(&purchase.item_id).cloned(),
                purchase,
            })
            .collect())
    }
}
