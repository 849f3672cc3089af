//! Request and query payloads
//!
//! Payloads are checked with `validator` and then converted into the
//! service commands. Acting user ids come from the caller's token.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{AdjustmentReason, TransferStatus};
use shared::types::TimeWindow;
use shared::validation::{
    normalize_category, normalize_optional_text, validate_non_negative_quantity,
    validate_nonzero_quantity, validate_positive_quantity, validate_required_text,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::services::adjustment::{OpeningStock, OpeningStockLine, RecordAdjustment};
use crate::services::inventory::{ItemPatch, NewItem};
use crate::services::purchase::RecordPurchase;
use crate::services::reporting::{MovementReportFilter, ReportPeriod};
use crate::services::transfer::{ItemSelector, RequestTransfer};
use crate::store::LedgerFilter;

fn check(result: Result<(), &'static str>, code: &'static str) -> Result<(), ValidationError> {
    result.map_err(|message| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        err
    })
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    check(validate_positive_quantity(*value), "range")
}

fn nonzero(value: &Decimal) -> Result<(), ValidationError> {
    check(validate_nonzero_quantity(*value), "range")
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    check(validate_non_negative_quantity(*value), "range")
}

fn required(value: &str) -> Result<(), ValidationError> {
    check(validate_required_text(value), "required")
}

/// Validate a payload, mapping failures onto a field-level error
pub fn validated<T: Validate>(payload: T) -> AppResult<T> {
    payload.validate()?;
    Ok(payload)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItemRequest {
    pub branch_id: Uuid,
    #[validate(length(max = 100), custom = "required")]
    pub category: String,
    #[validate(length(max = 200), custom = "required")]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub min_quantity: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub unit: Option<String>,
}

impl CreateItemRequest {
    pub fn into_command(self) -> NewItem {
        NewItem {
            branch_id: self.branch_id,
            category: normalize_category(&self.category),
            name: self.name.trim().to_string(),
            description: normalize_optional_text(self.description.as_deref()).unwrap_or_default(),
            min_quantity: self.min_quantity.unwrap_or(Decimal::ZERO),
            unit: normalize_optional_text(self.unit.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(max = 200), custom = "required")]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub min_quantity: Option<Decimal>,
    #[validate(length(max = 50), custom = "required")]
    pub unit: Option<String>,
}

impl UpdateItemRequest {
    pub fn into_patch(self) -> ItemPatch {
        ItemPatch {
            name: self.name.map(|name| name.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            min_quantity: self.min_quantity,
            unit: self.unit.map(|unit| unit.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    #[validate(custom = "positive")]
    pub quantity: Decimal,
    #[validate(length(max = 200), custom = "required")]
    pub supplier_name: String,
    #[validate(length(max = 100))]
    pub invoice_number: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreatePurchaseRequest {
    pub fn into_command(self, created_by: Uuid) -> RecordPurchase {
        RecordPurchase {
            branch_id: self.branch_id,
            item_id: self.item_id,
            quantity: self.quantity,
            supplier_name: self.supplier_name.trim().to_string(),
            invoice_number: normalize_optional_text(self.invoice_number.as_deref()),
            purchase_date: self.purchase_date,
            notes: normalize_optional_text(self.notes.as_deref()).unwrap_or_default(),
            created_by,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransferRequest {
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub item_id: Option<Uuid>,
    #[validate(length(max = 200))]
    pub item_name: Option<String>,
    #[validate(length(max = 100))]
    pub item_category: Option<String>,
    #[validate(custom = "positive")]
    pub quantity: Decimal,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateTransferRequest {
    /// Item id wins; otherwise both name and category are required
    pub fn into_command(self, requested_by: Uuid) -> AppResult<RequestTransfer> {
        let item = match self.item_id {
            Some(item_id) => ItemSelector::Id(item_id),
            None => {
                let name = normalize_optional_text(self.item_name.as_deref());
                let category = normalize_optional_text(self.item_category.as_deref());
                match (name, category) {
                    (Some(name), Some(category)) => ItemSelector::NameAndCategory {
                        name,
                        category: normalize_category(&category),
                    },
                    _ => {
                        return Err(AppError::validation(
                            "item_id",
                            "Either item_id or item_name with item_category is required",
                        ))
                    }
                }
            }
        };

        Ok(RequestTransfer {
            from_branch_id: self.from_branch_id,
            to_branch_id: self.to_branch_id,
            item,
            quantity: self.quantity,
            notes: normalize_optional_text(self.notes.as_deref()).unwrap_or_default(),
            requested_by,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAdjustmentRequest {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    #[validate(custom = "nonzero")]
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl CreateAdjustmentRequest {
    pub fn into_command(self, adjusted_by: Uuid) -> RecordAdjustment {
        RecordAdjustment {
            branch_id: self.branch_id,
            item_id: self.item_id,
            quantity: self.quantity,
            reason: self.reason,
            description: normalize_optional_text(self.description.as_deref()).unwrap_or_default(),
            adjusted_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningStockLineRequest {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Per-line quantities are checked while applying, so one bad line does not
/// reject the batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpeningStockRequest {
    pub branch_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OpeningStockLineRequest>,
}

impl OpeningStockRequest {
    pub fn into_command(self, adjusted_by: Uuid) -> OpeningStock {
        OpeningStock {
            branch_id: self.branch_id,
            lines: self
                .items
                .into_iter()
                .map(|line| OpeningStockLine {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect(),
            adjusted_by,
        }
    }
}

/// Branch-scoped item listing query
#[derive(Debug, Clone, Deserialize)]
pub struct ItemQuery {
    pub branch_id: Uuid,
    pub category: Option<String>,
}

impl ItemQuery {
    pub fn category(&self) -> Option<String> {
        self.category.as_deref().map(normalize_category)
    }
}

/// Purchase and adjustment listing query
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerQuery {
    pub branch_id: Uuid,
    pub item_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl LedgerQuery {
    pub fn filter(&self) -> LedgerFilter {
        LedgerFilter {
            branch_id: Some(self.branch_id),
            item_id: self.item_id,
            window: TimeWindow::from_dates(self.start_date, self.end_date),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferQuery {
    pub branch_id: Uuid,
    pub status: Option<TransferStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementReportQuery {
    pub branch_id: Uuid,
    pub item_id: Option<Uuid>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MovementReportQuery {
    pub fn filter(&self) -> MovementReportFilter {
        MovementReportFilter {
            item_id: self.item_id,
            category: self.category.as_deref().map(normalize_category),
            period: ReportPeriod {
                start_date: self.start_date,
                end_date: self.end_date,
            },
        }
    }
}

/// Query naming only the branch
#[derive(Debug, Clone, Deserialize)]
pub struct BranchQuery {
    pub branch_id: Uuid,
}
