//! Supplier purchase models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemSummary;

/// A supplier delivery that increased an item's stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub supplier_name: String,
    pub invoice_number: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub notes: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PurchaseEntry {
    /// Note carried by the ledger entry this purchase produces
    pub fn movement_note(&self) -> String {
        match &self.invoice_number {
            Some(invoice) => format!("Purchase from {} (Invoice: {})", self.supplier_name, invoice),
            None => format!("Purchase from {}", self.supplier_name),
        }
    }
}

/// Purchase entry with its item summary
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: PurchaseEntry,
    pub item: Option<ItemSummary>,
}
