//! Inter-branch stock transfer models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemSummary;
use crate::types::ParseEnumError;

/// Lifecycle of a transfer request
///
/// `Pending -> Approved -> Completed` on approval, `Pending -> Rejected` on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Completed => "completed",
            TransferStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::Pending, TransferStatus::Approved)
                | (TransferStatus::Pending, TransferStatus::Rejected)
                | (TransferStatus::Approved, TransferStatus::Completed)
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "approved" => Ok(TransferStatus::Approved),
            "completed" => Ok(TransferStatus::Completed),
            "rejected" => Ok(TransferStatus::Rejected),
            other => Err(ParseEnumError::new("transfer status", other)),
        }
    }
}

/// A request to move stock of one item between two branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTransfer {
    pub id: Uuid,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    /// Item in the source branch
    pub item_id: Uuid,
    /// Fixed at request time
    pub quantity: Decimal,
    pub status: TransferStatus,
    pub requested_by: Uuid,
    /// Approver, or the rejecting actor for rejected transfers
    pub approved_by: Option<Uuid>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub notes: String,
}

impl StockTransfer {
    pub fn involves_branch(&self, branch_id: Uuid) -> bool {
        self.from_branch_id == branch_id || self.to_branch_id == branch_id
    }

    pub fn outbound_note(&self) -> String {
        format!("Transfer to branch {}", self.to_branch_id)
    }

    pub fn inbound_note(&self) -> String {
        format!("Transfer from branch {}", self.from_branch_id)
    }
}

/// Transfer with its item summary
#[derive(Debug, Clone, Serialize)]
pub struct TransferView {
    #[serde(flatten)]
    pub transfer: StockTransfer,
    pub item: Option<ItemSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_the_only_entry_to_approval_or_rejection() {
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Approved));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Rejected));
        assert!(TransferStatus::Approved.can_transition_to(TransferStatus::Completed));

        assert!(!TransferStatus::Pending.can_transition_to(TransferStatus::Completed));
        assert!(!TransferStatus::Rejected.can_transition_to(TransferStatus::Approved));
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::Approved));
        assert!(!TransferStatus::Approved.can_transition_to(TransferStatus::Rejected));
    }

    #[test]
    fn test_status_parses_query_values() {
        assert_eq!("pending".parse::<TransferStatus>().unwrap(), TransferStatus::Pending);
        assert!("cancelled".parse::<TransferStatus>().is_err());
    }
}
