//! Stock ledger tests
//!
//! Purchases, the stock-mutation service and the stock/ledger reconciliation
//! property, run against the in-process store.

mod common;

use common::{dec, fixture, Fixture};
use proptest::prelude::*;
use rust_decimal::Decimal;
use school_inventory::error::AppError;
use school_inventory::services::adjustment::RecordAdjustment;
use school_inventory::services::purchase::{PurchaseService, RecordPurchase};
use school_inventory::services::reporting::ReportingService;
use school_inventory::services::transfer::{ItemSelector, RequestTransfer, TransferService};
use school_inventory::store::{ItemFilter, LedgerFilter};
use shared::models::{AdjustmentReason, MovementType, ReferenceType};
use shared::validation::{checked_total, MAX_QUANTITY};
use uuid::Uuid;

fn purchases(f: &Fixture) -> PurchaseService {
    PurchaseService::new(f.store.clone(), 100)
}

fn purchase(f: &Fixture, branch_id: Uuid, item_id: Uuid, quantity: i64) -> RecordPurchase {
    RecordPurchase {
        branch_id,
        item_id,
        quantity: dec(quantity),
        supplier_name: "Acme Supplies".to_string(),
        invoice_number: Some("INV-001".to_string()),
        purchase_date: None,
        notes: String::new(),
        created_by: f.actor,
    }
}

// ============================================================================
// Purchase Flow
// ============================================================================

#[tokio::test]
async fn test_purchase_credits_stock_and_appends_one_movement() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 50).await;

    let outcome = purchases(&f)
        .record_purchase(purchase(&f, f.north.id, chalk.id, 20))
        .await
        .unwrap();

    assert_eq!(outcome.item.current_stock, dec(70));
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(70));

    let movements = f
        .store
        .list_movements(
            &LedgerFilter {
                item_id: Some(chalk.id),
                ..Default::default()
            },
            100,
        )
        .await
        .unwrap();
    let purchase_movements: Vec<_> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Purchase)
        .collect();

    assert_eq!(purchase_movements.len(), 1);
    assert_eq!(purchase_movements[0].quantity, dec(20));
    assert_eq!(purchase_movements[0].reference_type, ReferenceType::PurchaseEntry);
    assert_eq!(purchase_movements[0].reference_id, outcome.purchase.id);
    assert_eq!(
        purchase_movements[0].notes,
        "Purchase from Acme Supplies (Invoice: INV-001)"
    );
}

#[tokio::test]
async fn test_purchase_of_item_from_other_branch_is_rejected() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 50).await;

    let err = purchases(&f)
        .record_purchase(purchase(&f, f.south.id, chalk.id, 20))
        .await
        .unwrap_err();

    match err {
        AppError::Validation { field, message } => {
            assert_eq!(field, "item_id");
            assert_eq!(message, "Item not found or does not belong to branch");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(50));
    assert!(f
        .store
        .list_purchases(&LedgerFilter::default(), 100)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_oversized_purchases_are_rejected_without_touching_stock() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 50).await;
    let huge: Decimal = "50000000000000000000000000000".parse().unwrap();

    for _ in 0..2 {
        let mut request = purchase(&f, f.north.id, chalk.id, 1);
        request.quantity = huge;
        let err = purchases(&f).record_purchase(request).await.unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "quantity"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    let mut largest = purchase(&f, f.north.id, chalk.id, 1);
    largest.quantity = Decimal::from(MAX_QUANTITY);
    let outcome = purchases(&f).record_purchase(largest).await.unwrap();
    assert_eq!(outcome.item.current_stock, Decimal::from(MAX_QUANTITY + 50));
}

#[tokio::test]
async fn test_failed_commit_leaves_no_purchase_and_is_retryable() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 50).await;

    f.memory.fail_next_commit();
    let err = purchases(&f)
        .record_purchase(purchase(&f, f.north.id, chalk.id, 20))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(50));
    assert!(f
        .store
        .list_purchases(&LedgerFilter::default(), 100)
        .await
        .unwrap()
        .is_empty());

    // Resubmitting succeeds once storage recovers
    let outcome = purchases(&f)
        .record_purchase(purchase(&f, f.north.id, chalk.id, 20))
        .await
        .unwrap();
    assert_eq!(outcome.item.current_stock, dec(70));
}

#[tokio::test]
async fn test_purchase_listing_is_branch_scoped_and_carries_item() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 0).await;
    let paper = f.item(f.south.id, "Paper", 0).await;

    let service = purchases(&f);
    service
        .record_purchase(purchase(&f, f.north.id, chalk.id, 5))
        .await
        .unwrap();
    service
        .record_purchase(purchase(&f, f.south.id, paper.id, 7))
        .await
        .unwrap();
    service
        .record_purchase(purchase(&f, f.north.id, chalk.id, 9))
        .await
        .unwrap();

    let listed = service
        .list_purchases(&LedgerFilter {
            branch_id: Some(f.north.id),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].purchase.quantity, dec(9));
    assert_eq!(listed[1].purchase.quantity, dec(5));
    let item = listed[0].item.as_ref().unwrap();
    assert_eq!(item.name, "Chalk");
    assert_eq!(item.unit, "boxes");
}

// ============================================================================
// Reconciliation Property
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Purchase(i64),
    Adjust(i64),
    Transfer(i64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1i64..50).prop_map(Step::Purchase),
        (-60i64..60)
            .prop_filter("non-zero", |q| *q != 0)
            .prop_map(Step::Adjust),
        (1i64..40).prop_map(Step::Transfer),
    ]
}

/// Stock and ledger state across both branches after a run
struct LedgerCheck {
    stock: Decimal,
    ledger: Decimal,
    balanced: bool,
    non_negative: bool,
}

async fn run_steps(steps: Vec<Step>) -> LedgerCheck {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 0).await;
    let transfers = TransferService::new(f.store.clone(), 100);

    for step in steps {
        // Rejected steps must leave stock and ledger untouched
        let _ = match step {
            Step::Purchase(q) => purchases(&f)
                .record_purchase(purchase(&f, f.north.id, chalk.id, q))
                .await
                .map(|_| ()),
            Step::Adjust(q) => f
                .adjustments()
                .record_adjustment(RecordAdjustment {
                    branch_id: f.north.id,
                    item_id: chalk.id,
                    quantity: dec(q),
                    reason: AdjustmentReason::Other,
                    description: String::new(),
                    adjusted_by: f.actor,
                })
                .await
                .map(|_| ()),
            Step::Transfer(q) => {
                let requested = transfers
                    .request_transfer(RequestTransfer {
                        from_branch_id: f.north.id,
                        to_branch_id: f.south.id,
                        item: ItemSelector::Id(chalk.id),
                        quantity: dec(q),
                        notes: String::new(),
                        requested_by: f.actor,
                    })
                    .await;
                match requested {
                    Ok(transfer) => transfers
                        .approve_transfer(transfer.id, f.actor)
                        .await
                        .map(|_| ()),
                    Err(e) => Err(e),
                }
            }
        };
    }

    let mut items = Vec::new();
    for branch_id in [f.north.id, f.south.id] {
        items.extend(
            f.store
                .list_items(&ItemFilter {
                    branch_id,
                    ..Default::default()
                })
                .await
                .unwrap(),
        );
    }
    let movements = f
        .store
        .list_movements(&LedgerFilter::default(), i64::MAX)
        .await
        .unwrap();

    let reports = ReportingService::new(f.store.clone(), 500);
    let mut balanced = true;
    for branch_id in [f.north.id, f.south.id] {
        balanced &= reports.reconciliation(branch_id).await.unwrap().balanced;
    }

    LedgerCheck {
        stock: checked_total(items.iter().map(|item| item.current_stock)).unwrap(),
        ledger: shared::models::ledger_balance(&movements).unwrap(),
        balanced,
        non_negative: items.iter().all(|item| item.current_stock >= Decimal::ZERO),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Stock always equals the sum of its ledger deltas and never goes negative
    #[test]
    fn prop_stock_matches_ledger(steps in prop::collection::vec(step_strategy(), 1..25)) {
        let check = tokio_test::block_on(run_steps(steps));

        prop_assert_eq!(check.stock, check.ledger);
        prop_assert!(check.non_negative);
        prop_assert!(check.balanced);
    }
}
