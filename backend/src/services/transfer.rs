//! Stock transfer workflow between branches of one institution
//!
//! A transfer is requested as `pending`. Approval re-checks the source stock,
//! debits the source, credits the destination (creating the destination's
//! matching item when needed) and completes the transfer, all in one unit of
//! work. Rejection only records the decision.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    InventoryItem, MovementType, ReferenceType, StockMovement, StockTransfer, TransferStatus,
    TransferView,
};
use shared::validation::validate_positive_quantity;
use uuid::Uuid;

use super::item_summaries;
use super::ledger::{apply_mutation, StockMutation};
use crate::error::{AppError, AppResult};
use crate::store::{DynInventoryStore, StockTx, TransferFilter};

/// Transfer service for moving stock between branches
#[derive(Clone)]
pub struct TransferService {
    store: DynInventoryStore,
    list_limit: i64,
}

/// How a transfer request names the source item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSelector {
    Id(Uuid),
    /// Name and normalized category, matched within the source branch
    NameAndCategory { name: String, category: String },
}

/// Validated command for requesting a transfer
#[derive(Debug, Clone)]
pub struct RequestTransfer {
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub item: ItemSelector,
    pub quantity: Decimal,
    pub notes: String,
    pub requested_by: Uuid,
}

/// Completed transfer with both sides of the stock change
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    #[serde(flatten)]
    pub transfer: StockTransfer,
    pub source_item: InventoryItem,
    pub destination_item: InventoryItem,
    pub movements: Vec<StockMovement>,
}

fn not_pending() -> AppError {
    AppError::InvalidStateTransition("Transfer is not in pending status".to_string())
}

/// Move `transfer` to `next`, enforcing the state machine
fn transition(transfer: &mut StockTransfer, next: TransferStatus) -> AppResult<()> {
    if !transfer.status.can_transition_to(next) {
        return Err(not_pending());
    }
    transfer.status = next;
    Ok(())
}

async fn load_transfer(tx: &mut dyn StockTx, transfer_id: Uuid) -> AppResult<StockTransfer> {
    tx.find_transfer(transfer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))
}

impl TransferService {
    pub fn new(store: DynInventoryStore, list_limit: i64) -> Self {
        Self { store, list_limit }
    }

    /// Create a pending transfer request
    pub async fn request_transfer(&self, input: RequestTransfer) -> AppResult<StockTransfer> {
        validate_positive_quantity(input.quantity)
            .map_err(|message| AppError::validation("quantity", message))?;
        if input.from_branch_id == input.to_branch_id {
            return Err(AppError::validation(
                "to_branch_id",
                "Cannot transfer to the same branch",
            ));
        }

        let mut tx = self.store.begin().await?;

        let from_branch = tx.find_branch(input.from_branch_id).await?;
        let to_branch = tx.find_branch(input.to_branch_id).await?;
        let (from_branch, to_branch) = match (from_branch, to_branch) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(AppError::NotFound("Branch".to_string())),
        };
        if !from_branch.is_sibling_of(&to_branch) {
            return Err(AppError::validation(
                "to_branch_id",
                "Branches must belong to the same institution",
            ));
        }

        let item = match &input.item {
            ItemSelector::Id(item_id) => tx
                .find_item(*item_id)
                .await?
                .filter(|item| item.branch_id == input.from_branch_id),
            ItemSelector::NameAndCategory { name, category } => {
                tx.find_item_by_name(input.from_branch_id, name, category)
                    .await?
            }
        }
        .ok_or_else(|| AppError::validation("item_id", "Item not found in source branch"))?;

        // Soft check only; stock is not reserved until approval
        if item.current_stock < input.quantity {
            return Err(AppError::InsufficientStock {
                available: item.current_stock,
                requested: input.quantity,
            });
        }

        let transfer = StockTransfer {
            id: Uuid::new_v4(),
            from_branch_id: input.from_branch_id,
            to_branch_id: input.to_branch_id,
            item_id: item.id,
            quantity: input.quantity,
            status: TransferStatus::Pending,
            requested_by: input.requested_by,
            approved_by: None,
            request_date: Utc::now(),
            approved_date: None,
            completed_date: None,
            notes: input.notes,
        };
        tx.insert_transfer(&transfer).await?;
        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.id,
            from = %transfer.from_branch_id,
            to = %transfer.to_branch_id,
            quantity = %transfer.quantity,
            "transfer requested"
        );

        Ok(transfer)
    }

    /// Approve and complete a pending transfer.
    ///
    /// On any failure nothing is applied and the transfer stays pending, so
    /// the approval can be resubmitted.
    pub async fn approve_transfer(
        &self,
        transfer_id: Uuid,
        approved_by: Uuid,
    ) -> AppResult<TransferOutcome> {
        let mut tx = self.store.begin().await?;
        let mut transfer = load_transfer(tx.as_mut(), transfer_id).await?;

        if transfer.status != TransferStatus::Pending {
            return Err(not_pending());
        }

        // Stock may have moved since the request
        let source = tx
            .find_item(transfer.item_id)
            .await?
            .ok_or_else(|| AppError::validation("item_id", "Item not found"))?;
        if source.current_stock < transfer.quantity {
            return Err(AppError::InsufficientStock {
                available: source.current_stock,
                requested: transfer.quantity,
            });
        }

        let now = Utc::now();
        transition(&mut transfer, TransferStatus::Approved)?;
        transfer.approved_by = Some(approved_by);
        transfer.approved_date = Some(now);
        tx.update_transfer(&transfer).await?;

        let debit = apply_mutation(
            tx.as_mut(),
            StockMutation {
                branch_id: transfer.from_branch_id,
                item_id: transfer.item_id,
                delta: -transfer.quantity,
                movement_type: MovementType::TransferOut,
                reference_type: ReferenceType::StockTransfer,
                reference_id: transfer.id,
                notes: transfer.outbound_note(),
            },
        )
        .await?;

        let (destination, created) = tx
            .find_or_insert_item(&source.replicate_for_branch(transfer.to_branch_id, now))
            .await?;
        if created {
            tracing::info!(
                item_id = %destination.id,
                branch_id = %destination.branch_id,
                "inventory item created for incoming transfer"
            );
        }

        let credit = apply_mutation(
            tx.as_mut(),
            StockMutation {
                branch_id: transfer.to_branch_id,
                item_id: destination.id,
                delta: transfer.quantity,
                movement_type: MovementType::TransferIn,
                reference_type: ReferenceType::StockTransfer,
                reference_id: transfer.id,
                notes: transfer.inbound_note(),
            },
        )
        .await?;

        transition(&mut transfer, TransferStatus::Completed)?;
        transfer.completed_date = Some(Utc::now());
        tx.update_transfer(&transfer).await?;

        tx.commit().await?;

        tracing::info!(transfer_id = %transfer.id, approved_by = %approved_by, "transfer completed");

        Ok(TransferOutcome {
            transfer,
            source_item: debit.item,
            destination_item: credit.item,
            movements: vec![debit.movement, credit.movement],
        })
    }

    /// Reject a pending transfer; stock is untouched
    pub async fn reject_transfer(
        &self,
        transfer_id: Uuid,
        rejected_by: Uuid,
    ) -> AppResult<StockTransfer> {
        let mut tx = self.store.begin().await?;
        let mut transfer = load_transfer(tx.as_mut(), transfer_id).await?;

        transition(&mut transfer, TransferStatus::Rejected)?;
        transfer.approved_by = Some(rejected_by);
        tx.update_transfer(&transfer).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = %transfer.id, rejected_by = %rejected_by, "transfer rejected");
        Ok(transfer)
    }

    /// Get one transfer
    pub async fn get_transfer(&self, transfer_id: Uuid) -> AppResult<TransferView> {
        let transfer = self
            .store
            .find_transfer(transfer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;
        let item = self
            .store
            .find_item(transfer.item_id)
            .await?
            .map(|item| item.summary());

        Ok(TransferView { transfer, item })
    }

    /// Transfers into or out of a branch, newest first
    pub async fn list_transfers(&self, filter: &TransferFilter) -> AppResult<Vec<TransferView>> {
        let transfers = self.store.list_transfers(filter, self.list_limit).await?;
        let summaries =
            item_summaries(self.store.as_ref(), transfers.iter().map(|t| t.item_id)).await?;

        Ok(transfers
            .into_iter()
            .map(|transfer| TransferView {
                item: summaries.get(&transfer.item_id).cloned(),
                transfer,
            })
            .collect())
    }
}
