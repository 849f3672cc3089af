//! Reporting service: read-only views over items and the movement ledger

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{InventoryItem, ItemSummary, ItemView, MovementView};
use shared::types::TimeWindow;
use shared::validation::checked_total;
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{DynInventoryStore, ItemFilter, LedgerFilter};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: DynInventoryStore,
    movement_limit: i64,
}

/// Stock on hand for a branch
#[derive(Debug, Serialize)]
pub struct CurrentStockReport {
    pub branch_id: Uuid,
    pub total_items: usize,
    pub by_category: BTreeMap<String, Vec<ItemView>>,
    pub items: Vec<ItemView>,
}

/// Requested report dates, echoed back as given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportPeriod {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_dates(self.start_date, self.end_date)
    }
}

/// Movement report filter
#[derive(Debug, Clone, Default)]
pub struct MovementReportFilter {
    pub item_id: Option<Uuid>,
    pub category: Option<String>,
    pub period: ReportPeriod,
}

/// Totals for one item over the reported movements
#[derive(Debug, Clone, Serialize)]
pub struct ItemMovementTotals {
    pub item: ItemSummary,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub movement_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MovementReport {
    pub branch_id: Uuid,
    pub period: ReportPeriod,
    pub items: Vec<ItemMovementTotals>,
    pub movements: Vec<MovementView>,
}

/// Quantity totals for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryValuation {
    pub category: String,
    pub item_count: usize,
    pub total_quantity: Decimal,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct ValuationReport {
    pub branch_id: Uuid,
    pub total_items: usize,
    pub total_categories: usize,
    pub total_quantity: Decimal,
    pub categories: Vec<CategoryValuation>,
    pub items: Vec<ItemView>,
}

/// Stock on hand against the ledger for one item
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationLine {
    pub item: ItemSummary,
    pub current_stock: Decimal,
    pub ledger_total: Decimal,
    pub balanced: bool,
}

#[derive(Debug, Serialize)]
pub struct ReconciliationReport {
    pub branch_id: Uuid,
    pub balanced: bool,
    pub items: Vec<ReconciliationLine>,
}

impl ReportingService {
    pub fn new(store: DynInventoryStore, movement_limit: i64) -> Self {
        Self {
            store,
            movement_limit,
        }
    }

    async fn branch_items(
        &self,
        branch_id: Uuid,
        category: Option<String>,
    ) -> AppResult<Vec<InventoryItem>> {
        self.store
            .list_items(&ItemFilter {
                branch_id,
                category,
                low_stock_only: false,
            })
            .await
    }

    /// Current stock grouped by category
    pub async fn current_stock(
        &self,
        branch_id: Uuid,
        category: Option<String>,
    ) -> AppResult<CurrentStockReport> {
        let items: Vec<ItemView> = self
            .branch_items(branch_id, category)
            .await?
            .into_iter()
            .map(ItemView::from)
            .collect();

        let mut by_category: BTreeMap<String, Vec<ItemView>> = BTreeMap::new();
        for view in &items {
            by_category
                .entry(view.item.category.clone())
                .or_default()
                .push(view.clone());
        }

        Ok(CurrentStockReport {
            branch_id,
            total_items: items.len(),
            by_category,
            items,
        })
    }

    /// Movements of a branch, newest first, with per-item in/out totals
    pub async fn movement_report(
        &self,
        branch_id: Uuid,
        filter: MovementReportFilter,
    ) -> AppResult<MovementReport> {
        let items: HashMap<Uuid, ItemSummary> = self
            .branch_items(branch_id, filter.category.clone())
            .await?
            .into_iter()
            .map(|item| (item.id, item.summary()))
            .collect();

        let movements = self
            .store
            .list_movements(
                &LedgerFilter {
                    branch_id: Some(branch_id),
                    item_id: filter.item_id,
                    window: filter.period.window(),
                },
                self.movement_limit,
            )
            .await?;

        let mut totals: Vec<ItemMovementTotals> = Vec::new();
        let mut positions: HashMap<Uuid, usize> = HashMap::new();
        let mut views = Vec::with_capacity(movements.len());

        for movement in movements {
            // Items outside the category filter are absent from the map
            let Some(summary) = items.get(&movement.item_id) else {
                continue;
            };

            let index = *positions.entry(movement.item_id).or_insert_with(|| {
                totals.push(ItemMovementTotals {
                    item: summary.clone(),
                    total_in: Decimal::ZERO,
                    total_out: Decimal::ZERO,
                    movement_count: 0,
                });
                totals.len() - 1
            });
            let entry = &mut totals[index];
            if movement.is_inbound() {
                entry.total_in = checked_total([entry.total_in, movement.quantity])?;
            } else {
                entry.total_out = checked_total([entry.total_out, movement.quantity.abs()])?;
            }
            entry.movement_count += 1;

            views.push(MovementView {
                item: Some(summary.clone()),
                movement,
            });
        }

        Ok(MovementReport {
            branch_id,
            period: filter.period,
            items: totals,
            movements: views,
        })
    }

    /// Quantity on hand per category; items carry no price
    pub async fn valuation(&self, branch_id: Uuid) -> AppResult<ValuationReport> {
        let items = self.branch_items(branch_id, None).await?;

        let total_quantity = checked_total(items.iter().map(|item| item.current_stock))?;
        let views: Vec<ItemView> = items.into_iter().map(ItemView::from).collect();

        let mut categories: BTreeMap<String, CategoryValuation> = BTreeMap::new();
        for view in &views {
            let entry = categories
                .entry(view.item.category.clone())
                .or_insert_with(|| CategoryValuation {
                    category: view.item.category.clone(),
                    item_count: 0,
                    total_quantity: Decimal::ZERO,
                    items: Vec::new(),
                });
            entry.item_count += 1;
            entry.total_quantity = checked_total([entry.total_quantity, view.item.current_stock])?;
            entry.items.push(view.clone());
        }

        Ok(ValuationReport {
            branch_id,
            total_items: views.len(),
            total_categories: categories.len(),
            total_quantity,
            categories: categories.into_values().collect(),
            items: views,
        })
    }

    /// Compare every item's stock with the sum of its ledger deltas
    pub async fn reconciliation(&self, branch_id: Uuid) -> AppResult<ReconciliationReport> {
        let items = self.branch_items(branch_id, None).await?;
        let totals: HashMap<Uuid, Decimal> = self
            .store
            .ledger_totals(branch_id)
            .await?
            .into_iter()
            .collect();

        let lines: Vec<ReconciliationLine> = items
            .into_iter()
            .map(|item| {
                let ledger_total = totals.get(&item.id).copied().unwrap_or(Decimal::ZERO);
                ReconciliationLine {
                    balanced: ledger_total == item.current_stock,
                    current_stock: item.current_stock,
                    ledger_total,
                    item: item.summary(),
                }
            })
            .collect();

        let balanced = lines.iter().all(|line| line.balanced);
        if !balanced {
            tracing::warn!(branch_id = %branch_id, "stock ledger out of balance");
        }

        Ok(ReconciliationReport {
            branch_id,
            balanced,
            items: lines,
        })
    }
}
