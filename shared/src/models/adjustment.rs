//! Manual stock adjustment models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemSummary, MovementType};
use crate::types::ParseEnumError;

/// Why stock was corrected by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Damage,
    Expiry,
    Disposal,
    Other,
    OpeningStock,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Damage => "damage",
            AdjustmentReason::Expiry => "expiry",
            AdjustmentReason::Disposal => "disposal",
            AdjustmentReason::Other => "other",
            AdjustmentReason::OpeningStock => "opening_stock",
        }
    }

    /// Ledger movement type recorded for an adjustment with this reason
    pub fn movement_type(&self) -> MovementType {
        match self {
            AdjustmentReason::OpeningStock => MovementType::OpeningStock,
            _ => MovementType::Adjustment,
        }
    }
}

impl fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "damage" => Ok(AdjustmentReason::Damage),
            "expiry" => Ok(AdjustmentReason::Expiry),
            "disposal" => Ok(AdjustmentReason::Disposal),
            "other" => Ok(AdjustmentReason::Other),
            "opening_stock" => Ok(AdjustmentReason::OpeningStock),
            other => Err(ParseEnumError::new("adjustment reason", other)),
        }
    }
}

/// A manual correction of an item's stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub item_id: Uuid,
    /// Signed; negative for reductions
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub description: String,
    pub adjusted_by: Uuid,
    pub adjustment_date: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn movement_note(&self) -> String {
        if self.description.is_empty() {
            format!("Adjustment: {}", self.reason)
        } else {
            format!("Adjustment: {} - {}", self.reason, self.description)
        }
    }
}

/// Adjustment with its item summary
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentView {
    #[serde(flatten)]
    pub adjustment: StockAdjustment,
    pub item: Option<ItemSummary>,
}
