//! Manual stock adjustments and opening-stock entry

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    AdjustmentReason, AdjustmentView, InventoryItem, ReferenceType, StockAdjustment,
    StockMovement,
};
use shared::validation::{validate_non_negative_quantity, validate_nonzero_quantity};
use uuid::Uuid;

use super::item_summaries;
use super::ledger::{apply_mutation, StockMutation};
use crate::error::{AppError, AppResult};
use crate::store::{DynInventoryStore, LedgerFilter};

const OPENING_STOCK_DESCRIPTION: &str = "Opening stock entry";

/// Adjustment service for hand corrections of stock
#[derive(Clone)]
pub struct AdjustmentService {
    store: DynInventoryStore,
    list_limit: i64,
}

/// Validated command for one adjustment
#[derive(Debug, Clone)]
pub struct RecordAdjustment {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    /// Signed; negative reduces stock
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub description: String,
    pub adjusted_by: Uuid,
}

/// Recorded adjustment with the stock change it caused
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    #[serde(flatten)]
    pub adjustment: StockAdjustment,
    pub item: InventoryItem,
    pub movement: StockMovement,
}

/// Target stock for one item in an opening-stock batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningStockLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Opening-stock batch for one branch
#[derive(Debug, Clone)]
pub struct OpeningStock {
    pub branch_id: Uuid,
    pub lines: Vec<OpeningStockLine>,
    pub adjusted_by: Uuid,
}

/// Stock after an applied opening-stock line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpeningStockApplied {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OpeningStockResult {
    pub items: Vec<OpeningStockApplied>,
}

impl AdjustmentService {
    pub fn new(store: DynInventoryStore, list_limit: i64) -> Self {
        Self { store, list_limit }
    }

    /// Record an adjustment and apply its delta in one unit of work
    pub async fn record_adjustment(
        &self,
        input: RecordAdjustment,
    ) -> AppResult<AdjustmentOutcome> {
        validate_nonzero_quantity(input.quantity)
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

        let adjustment = StockAdjustment {
            id: Uuid::new_v4(),
            branch_id: input.branch_id,
            item_id: input.item_id,
            quantity: input.quantity,
            reason: input.reason,
            description: input.description,
            adjusted_by: input.adjusted_by,
            adjustment_date: Utc::now(),
        };
        tx.insert_adjustment(&adjustment).await?;

        let outcome = apply_mutation(
            tx.as_mut(),
            StockMutation {
                branch_id: adjustment.branch_id,
                item_id: adjustment.item_id,
                delta: adjustment.quantity,
                movement_type: adjustment.reason.movement_type(),
                reference_type: ReferenceType::StockAdjustment,
                reference_id: adjustment.id,
                notes: adjustment.movement_note(),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(AdjustmentOutcome {
            adjustment,
            item: outcome.item,
            movement: outcome.movement,
        })
    }

    /// Bring each listed item to its target stock.
    ///
    /// Lines are applied independently. A line that cannot be applied is
    /// logged and skipped; lines already applied stay applied.
    pub async fn apply_opening_stock(&self, batch: OpeningStock) -> AppResult<OpeningStockResult> {
        let mut result = OpeningStockResult::default();

        for line in batch.lines {
            match self
                .apply_opening_line(batch.branch_id, line, batch.adjusted_by)
                .await
            {
                Ok(Some(applied)) => result.items.push(applied),
                Ok(None) => {
                    tracing::debug!(item_id = %line.item_id, "opening stock line unchanged");
                }
                Err(e) => {
                    tracing::warn!(
                        item_id = %line.item_id,
                        branch_id = %batch.branch_id,
                        error = %e,
                        "opening stock line skipped"
                    );
                }
            }
        }

        Ok(result)
    }

    async fn apply_opening_line(
        &self,
        branch_id: Uuid,
        line: OpeningStockLine,
        adjusted_by: Uuid,
    ) -> AppResult<Option<OpeningStockApplied>> {
        validate_non_negative_quantity(line.quantity)
            .map_err(|message| AppError::validation("quantity", message))?;

        let mut tx = self.store.begin().await?;

        let item = tx
            .find_item(line.item_id)
            .await?
            .filter(|item| item.branch_id == branch_id)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let delta = line.quantity - item.current_stock;
        if delta.is_zero() {
            return Ok(None);
        }

        let reason = AdjustmentReason::OpeningStock;
        let adjustment = StockAdjustment {
            id: Uuid::new_v4(),
            branch_id,
            item_id: item.id,
            quantity: delta,
            reason,
            description: OPENING_STOCK_DESCRIPTION.to_string(),
            adjusted_by,
            adjustment_date: Utc::now(),
        };
        tx.insert_adjustment(&adjustment).await?;

        let outcome = apply_mutation(
            tx.as_mut(),
            StockMutation {
                branch_id,
                item_id: item.id,
                delta,
                movement_type: reason.movement_type(),
                reference_type: ReferenceType::StockAdjustment,
                reference_id: adjustment.id,
                notes: adjustment.movement_note(),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Some(OpeningStockApplied {
            item_id: item.id,
            quantity: outcome.item.current_stock,
        }))
    }

    /// List adjustments, newest first
    pub async fn list_adjustments(&self, filter: &LedgerFilter) -> AppResult<Vec<AdjustmentView>> {
        let adjustments = self.store.list_adjustments(filter, self.list_limit).await?;
        let summaries =
            item_summaries(self.store.as_ref(), adjustments.iter().map(|a| a.item_id)).await?;

        Ok(adjustments
            .into_iter()
            .map(|adjustment| AdjustmentView {
                item: summaries.get(&adjustment.item_id).cloned(),
                adjustment,
            })
            .collect())
    }
}
