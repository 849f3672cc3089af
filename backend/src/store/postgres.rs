//! PostgreSQL inventory store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Branch, InventoryItem, PurchaseEntry, StockAdjustment, StockMovement, StockTransfer,
};
use shared::validation::StockError;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{InventoryStore, ItemFilter, LedgerFilter, StockTx, TransferFilter};
use crate::error::{AppError, AppResult};

const STOCK_CHECK_CONSTRAINT: &str = "inventory_items_stock_non_negative";
const STOCK_LIMIT_CONSTRAINT: &str = "inventory_items_stock_within_limit";
const ITEM_UNIQUE_CONSTRAINT: &str = "inventory_items_branch_name_category_key";

/// Map constraint violations to domain errors; everything else stays a storage error
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(STOCK_CHECK_CONSTRAINT) => {
                return AppError::NegativeStock(db_err.message().to_string())
            }
            Some(STOCK_LIMIT_CONSTRAINT) => return StockError::Overflow.into(),
            Some(ITEM_UNIQUE_CONSTRAINT) => {
                return AppError::DuplicateEntry("name".to_string())
            }
            _ => {}
        }
    }
    AppError::DatabaseError(err)
}

fn corrupt(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Stored value could not be decoded: {}", err))
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    institution_id: Uuid,
    name: String,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            institution_id: row.institution_id,
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    branch_id: Uuid,
    category: String,
    name: String,
    description: String,
    current_stock: Decimal,
    min_quantity: Decimal,
    unit: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            branch_id: row.branch_id,
            category: row.category,
            name: row.name,
            description: row.description,
            current_stock: row.current_stock,
            min_quantity: row.min_quantity,
            unit: row.unit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    branch_id: Uuid,
    item_id: Uuid,
    movement_type: String,
    quantity: Decimal,
    reference_type: String,
    reference_id: Uuid,
    notes: String,
    movement_date: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.id,
            branch_id: row.branch_id,
            item_id: row.item_id,
            movement_type: row.movement_type.parse().map_err(corrupt)?,
            quantity: row.quantity,
            reference_type: row.reference_type.parse().map_err(corrupt)?,
            reference_id: row.reference_id,
            notes: row.notes,
            movement_date: row.movement_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    branch_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
    supplier_name: String,
    invoice_number: Option<String>,
    purchase_date: DateTime<Utc>,
    notes: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<PurchaseRow> for PurchaseEntry {
    fn from(row: PurchaseRow) -> Self {
        PurchaseEntry {
            id: row.id,
            branch_id: row.branch_id,
            item_id: row.item_id,
            quantity: row.quantity,
            supplier_name: row.supplier_name,
            invoice_number: row.invoice_number,
            purchase_date: row.purchase_date,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: Uuid,
    branch_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
    reason: String,
    description: String,
    adjusted_by: Uuid,
    adjustment_date: DateTime<Utc>,
}

impl TryFrom<AdjustmentRow> for StockAdjustment {
    type Error = AppError;

    fn try_from(row: AdjustmentRow) -> Result<Self, Self::Error> {
        Ok(StockAdjustment {
            id: row.id,
            branch_id: row.branch_id,
            item_id: row.item_id,
            quantity: row.quantity,
            reason: row.reason.parse().map_err(corrupt)?,
            description: row.description,
            adjusted_by: row.adjusted_by,
            adjustment_date: row.adjustment_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    from_branch_id: Uuid,
    to_branch_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
    status: String,
    requested_by: Uuid,
    approved_by: Option<Uuid>,
    request_date: DateTime<Utc>,
    approved_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
    notes: String,
}

impl TryFrom<TransferRow> for StockTransfer {
    type Error = AppError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        Ok(StockTransfer {
            id: row.id,
            from_branch_id: row.from_branch_id,
            to_branch_id: row.to_branch_id,
            item_id: row.item_id,
            quantity: row.quantity,
            status: row.status.parse().map_err(corrupt)?,
            requested_by: row.requested_by,
            approved_by: row.approved_by,
            request_date: row.request_date,
            approved_date: row.approved_date,
            completed_date: row.completed_date,
            notes: row.notes,
        })
    }
}

fn collect_rows<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ============================================================================
// Store
// ============================================================================

/// [`InventoryStore`] backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgInventoryStore {
    db: PgPool,
}

impl PgInventoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply the schema migrations shipped with the service
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StockTx>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgStockTx { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn find_branch(&self, branch_id: Uuid) -> AppResult<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(
            "SELECT id, institution_id, name FROM branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_item(&self, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, branch_id, category, name, description, current_stock, min_quantity,
                   unit, created_at, updated_at
            FROM inventory_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_items(&self, filter: &ItemFilter) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, branch_id, category, name, description, current_stock, min_quantity,
                   unit, created_at, updated_at
            FROM inventory_items
            WHERE branch_id = $1
              AND ($2::text IS NULL OR category = $2)
              AND (NOT $3 OR current_stock < min_quantity)
            ORDER BY category, name
            "#,
        )
        .bind(filter.branch_id)
        .bind(&filter.category)
        .bind(filter.low_stock_only)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn items_by_ids(&self, item_ids: &[Uuid]) -> AppResult<Vec<InventoryItem>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, branch_id, category, name, description, current_stock, min_quantity,
                   unit, created_at, updated_at
            FROM inventory_items
            WHERE id = ANY($1)
            "#,
        )
        .bind(item_ids.to_vec())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_purchases(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<PurchaseEntry>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, branch_id, item_id, quantity, supplier_name, invoice_number,
                   purchase_date, notes, created_by, created_at
            FROM purchase_entries
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
              AND ($3::timestamptz IS NULL OR purchase_date >= $3)
              AND ($4::timestamptz IS NULL OR purchase_date < $4)
            ORDER BY purchase_date DESC, created_at DESC
            LIMIT $5
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.item_id)
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_adjustments(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT id, branch_id, item_id, quantity, reason, description, adjusted_by,
                   adjustment_date
            FROM stock_adjustments
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
              AND ($3::timestamptz IS NULL OR adjustment_date >= $3)
              AND ($4::timestamptz IS NULL OR adjustment_date < $4)
            ORDER BY adjustment_date DESC
            LIMIT $5
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.item_id)
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        collect_rows(rows)
    }

    async fn list_movements(
        &self,
        filter: &LedgerFilter,
        limit: i64,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, branch_id, item_id, movement_type, quantity, reference_type,
                   reference_id, notes, movement_date
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
              AND ($3::timestamptz IS NULL OR movement_date >= $3)
              AND ($4::timestamptz IS NULL OR movement_date < $4)
            ORDER BY movement_date DESC, seq DESC
            LIMIT $5
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.item_id)
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        collect_rows(rows)
    }

    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        limit: i64,
    ) -> AppResult<Vec<StockTransfer>> {
        let rows = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT id, from_branch_id, to_branch_id, item_id, quantity, status, requested_by,
                   approved_by, request_date, approved_date, completed_date, notes
            FROM stock_transfers
            WHERE (from_branch_id = $1 OR to_branch_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY request_date DESC
            LIMIT $3
            "#,
        )
        .bind(filter.branch_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        collect_rows(rows)
    }

    async fn find_transfer(&self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>> {
        let row = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT id, from_branch_id, to_branch_id, item_id, quantity, status, requested_by,
                   approved_by, request_date, approved_date, completed_date, notes
            FROM stock_transfers
            WHERE id = $1
            "#,
        )
        .bind(transfer_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(StockTransfer::try_from).transpose()
    }

    async fn ledger_totals(&self, branch_id: Uuid) -> AppResult<Vec<(Uuid, Decimal)>> {
        let totals = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT item_id, COALESCE(SUM(quantity), 0)
            FROM stock_movements
            WHERE branch_id = $1
            GROUP BY item_id
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(totals)
    }
}

// ============================================================================
// Unit of work
// ============================================================================

/// Unit of work over one PostgreSQL transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgStockTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTx for PgStockTx {
    async fn find_branch(&mut self, branch_id: Uuid) -> AppResult<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(
            "SELECT id, institution_id, name FROM branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_item(&mut self, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, branch_id, category, name, description, current_stock, min_quantity,
                   unit, created_at, updated_at
            FROM inventory_items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_item_by_name(
        &mut self,
        branch_id: Uuid,
        name: &str,
        category: &str,
    ) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, branch_id, category, name, description, current_stock, min_quantity,
                   unit, created_at, updated_at
            FROM inventory_items
            WHERE branch_id = $1 AND name = $2 AND category = $3
            FOR UPDATE
            "#,
        )
        .bind(branch_id)
        .bind(name)
        .bind(category)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, branch_id, category, name, description, current_stock, min_quantity,
                unit, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(item.branch_id)
        .bind(&item.category)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.current_stock)
        .bind(item.min_quantity)
        .bind(&item.unit)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_or_insert_item(
        &mut self,
        item: &InventoryItem,
    ) -> AppResult<(InventoryItem, bool)> {
        // A conflicting insert waits for the other unit of work, then yields
        let inserted = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO inventory_items (
                id, branch_id, category, name, description, current_stock, min_quantity,
                unit, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (branch_id, name, category) DO NOTHING
            RETURNING id, branch_id, category, name, description, current_stock, min_quantity,
                      unit, created_at, updated_at
            "#,
        )
        .bind(item.id)
        .bind(item.branch_id)
        .bind(&item.category)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.current_stock)
        .bind(item.min_quantity)
        .bind(&item.unit)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = self
            .find_item_by_name(item.branch_id, &item.name, &item.category)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Inventory item {} vanished after insert conflict",
                    item.name
                ))
            })?;
        Ok((existing, false))
    }

    async fn update_item_details(&mut self, item: &InventoryItem) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $1, description = $2, min_quantity = $3, unit = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.min_quantity)
        .bind(&item.unit)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        Ok(())
    }

    async fn increment_stock(
        &mut self,
        item_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE inventory_items
            SET current_stock = current_stock + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, branch_id, category, name, description, current_stock, min_quantity,
                      unit, created_at, updated_at
            "#,
        )
        .bind(delta)
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Into::into))
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, branch_id, item_id, movement_type, quantity, reference_type, reference_id,
                notes, movement_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(movement.id)
        .bind(movement.branch_id)
        .bind(movement.item_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(movement.reference_type.as_str())
        .bind(movement.reference_id)
        .bind(&movement.notes)
        .bind(movement.movement_date)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn insert_purchase(&mut self, purchase: &PurchaseEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchase_entries (
                id, branch_id, item_id, quantity, supplier_name, invoice_number, purchase_date,
                notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.branch_id)
        .bind(purchase.item_id)
        .bind(purchase.quantity)
        .bind(&purchase.supplier_name)
        .bind(&purchase.invoice_number)
        .bind(purchase.purchase_date)
        .bind(&purchase.notes)
        .bind(purchase.created_by)
        .bind(purchase.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn insert_adjustment(&mut self, adjustment: &StockAdjustment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (
                id, branch_id, item_id, quantity, reason, description, adjusted_by,
                adjustment_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(adjustment.id)
        .bind(adjustment.branch_id)
        .bind(adjustment.item_id)
        .bind(adjustment.quantity)
        .bind(adjustment.reason.as_str())
        .bind(&adjustment.description)
        .bind(adjustment.adjusted_by)
        .bind(adjustment.adjustment_date)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn insert_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_transfers (
                id, from_branch_id, to_branch_id, item_id, quantity, status, requested_by,
                approved_by, request_date, approved_date, completed_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(transfer.id)
        .bind(transfer.from_branch_id)
        .bind(transfer.to_branch_id)
        .bind(transfer.item_id)
        .bind(transfer.quantity)
        .bind(transfer.status.as_str())
        .bind(transfer.requested_by)
        .bind(transfer.approved_by)
        .bind(transfer.request_date)
        .bind(transfer.approved_date)
        .bind(transfer.completed_date)
        .bind(&transfer.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_transfer(&mut self, transfer_id: Uuid) -> AppResult<Option<StockTransfer>> {
        let row = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT id, from_branch_id, to_branch_id, item_id, quantity, status, requested_by,
                   approved_by, request_date, approved_date, completed_date, notes
            FROM stock_transfers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(transfer_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(StockTransfer::try_from).transpose()
    }

    async fn update_transfer(&mut self, transfer: &StockTransfer) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE stock_transfers
            SET status = $1, approved_by = $2, approved_date = $3, completed_date = $4
            WHERE id = $5
            "#,
        )
        .bind(transfer.status.as_str())
        .bind(transfer.approved_by)
        .bind(transfer.approved_date)
        .bind(transfer.completed_date)
        .bind(transfer.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transfer".to_string()));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
