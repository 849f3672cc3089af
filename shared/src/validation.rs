//! Validation utilities for inventory records

use rust_decimal::Decimal;
use thiserror::Error;

/// Largest quantity a single purchase, transfer or adjustment may carry
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest on-hand stock an item may reach
pub const MAX_STOCK: i64 = 1_000_000_000_000_000;

/// Why a stock change cannot be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Stock cannot be negative")]
    Negative,
    #[error("Stock exceeds the maximum quantity")]
    Overflow,
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize an item category: trimmed and lowercased
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Normalize free text: trimmed, `None` when empty
pub fn normalize_optional_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Quantity Validations
// ============================================================================

fn validate_magnitude(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.abs() > Decimal::from(MAX_QUANTITY) {
        return Err("Quantity exceeds the maximum allowed");
    }
    Ok(())
}

/// Validate a quantity that must increase stock (purchases, transfers)
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    validate_magnitude(quantity)
}

/// Validate a signed adjustment quantity
pub fn validate_nonzero_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.is_zero() {
        return Err("Quantity must not be zero");
    }
    validate_magnitude(quantity)
}

/// Validate a reorder threshold or target stock level
pub fn validate_non_negative_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    validate_magnitude(quantity)
}

/// Apply `delta` to `current`, keeping stock within `0..=MAX_STOCK`
pub fn validate_resulting_stock(current: Decimal, delta: Decimal) -> Result<Decimal, StockError> {
    let next = current.checked_add(delta).ok_or(StockError::Overflow)?;
    if next < Decimal::ZERO {
        return Err(StockError::Negative);
    }
    if next > Decimal::from(MAX_STOCK) {
        return Err(StockError::Overflow);
    }
    Ok(next)
}

/// Sum quantities, failing instead of overflowing
pub fn checked_total(
    quantities: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, StockError> {
    quantities
        .into_iter()
        .try_fold(Decimal::ZERO, |total, quantity| total.checked_add(quantity))
        .ok_or(StockError::Overflow)
}

// ============================================================================
// Text Validations
// ============================================================================

/// Validate a required label such as an item name or category
pub fn validate_required_text(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Value is required");
    }
    Ok(())
}
