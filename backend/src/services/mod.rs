//! Business logic services for the school inventory ledger

use std::collections::{HashMap, HashSet};

use shared::models::ItemSummary;
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::InventoryStore;

pub mod access;
pub mod adjustment;
pub mod inventory;
pub mod ledger;
pub mod purchase;
pub mod reporting;
pub mod transfer;

pub use access::{authorize_branch, Access};
pub use adjustment::AdjustmentService;
pub use inventory::InventoryService;
pub use purchase::PurchaseService;
pub use reporting::ReportingService;
pub use transfer::TransferService;

/// Summaries of the given items keyed by id, for embedding in listings
pub(crate) async fn item_summaries(
    store: &dyn InventoryStore,
    item_ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, ItemSummary>> {
    let unique: Vec<Uuid> = item_ids
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let items = store.items_by_ids(&unique).await?;
    Ok(items
        .into_iter()
        .map(|item| (item.id, item.summary()))
        .collect())
}
