//! Stock movement ledger models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemSummary;
use crate::types::ParseEnumError;
use crate::validation::{checked_total, StockError};

/// Reason a movement changed stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    TransferIn,
    TransferOut,
    Adjustment,
    OpeningStock,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::TransferIn => "transfer_in",
            MovementType::TransferOut => "transfer_out",
            MovementType::Adjustment => "adjustment",
            MovementType::OpeningStock => "opening_stock",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(MovementType::Purchase),
            "transfer_in" => Ok(MovementType::TransferIn),
            "transfer_out" => Ok(MovementType::TransferOut),
            "adjustment" => Ok(MovementType::Adjustment),
            "opening_stock" => Ok(MovementType::OpeningStock),
            other => Err(ParseEnumError::new("movement type", other)),
        }
    }
}

/// Kind of business document a movement originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    PurchaseEntry,
    StockTransfer,
    StockAdjustment,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::PurchaseEntry => "PurchaseEntry",
            ReferenceType::StockTransfer => "StockTransfer",
            ReferenceType::StockAdjustment => "StockAdjustment",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PurchaseEntry" => Ok(ReferenceType::PurchaseEntry),
            "StockTransfer" => Ok(ReferenceType::StockTransfer),
            "StockAdjustment" => Ok(ReferenceType::StockAdjustment),
            other => Err(ParseEnumError::new("reference type", other)),
        }
    }
}

/// Immutable audit record of one stock change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub item_id: Uuid,
    pub movement_type: MovementType,
    /// Signed delta applied to the item's stock
    pub quantity: Decimal,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub notes: String,
    pub movement_date: DateTime<Utc>,
}

impl StockMovement {
    pub fn is_inbound(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

/// Movement with its item summary, as returned by reports
#[derive(Debug, Clone, Serialize)]
pub struct MovementView {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub item: Option<ItemSummary>,
}

/// Sum of signed movement deltas.
pub fn ledger_balance<'a>(
    movements: impl IntoIterator<Item = &'a StockMovement>,
) -> Result<Decimal, StockError> {
    checked_total(movements.into_iter().map(|m| m.quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_round_trips_through_str() {
        for t in [
            MovementType::Purchase,
            MovementType::TransferIn,
            MovementType::TransferOut,
            MovementType::Adjustment,
            MovementType::OpeningStock,
        ] {
            assert_eq!(t.as_str().parse::<MovementType>().unwrap(), t);
        }
        assert!("sale".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serializes_snake_case() {
        let json = serde_json::to_string(&MovementType::TransferOut).unwrap();
        assert_eq!(json, "\"transfer_out\"");
    }

    #[test]
    fn test_reference_type_keeps_document_names() {
        assert_eq!(ReferenceType::PurchaseEntry.to_string(), "PurchaseEntry");
        assert_eq!(
            "StockAdjustment".parse::<ReferenceType>().unwrap(),
            ReferenceType::StockAdjustment
        );
    }

    #[test]
    fn test_ledger_balance_sums_signed_deltas() {
        let movement = |q: i64| StockMovement {
            id: Uuid::new_v4(),
            branch_id: Uuid::nil(),
            item_id: Uuid::nil(),
            movement_type: MovementType::Adjustment,
            quantity: Decimal::from(q),
            reference_type: ReferenceType::StockAdjustment,
            reference_id: Uuid::nil(),
            notes: String::new(),
            movement_date: Utc::now(),
        };
        let movements = vec![movement(50), movement(20), movement(-15)];
        assert_eq!(ledger_balance(&movements), Ok(Decimal::from(55)));
        assert!(movements[0].is_inbound());
        assert!(!movements[2].is_inbound());
    }
}
