//! Stock transfer workflow tests
//!
//! Request checks, single-unit-of-work approval, rejection and the
//! pending → approved → completed / pending → rejected state machine.

mod common;

use common::{dec, fixture, Fixture};
use school_inventory::error::AppError;
use school_inventory::services::adjustment::RecordAdjustment;
use school_inventory::services::reporting::ReportingService;
use school_inventory::services::transfer::{ItemSelector, RequestTransfer, TransferService};
use school_inventory::store::{ItemFilter, LedgerFilter, TransferFilter};
use shared::models::{ledger_balance, AdjustmentReason, MovementType, TransferStatus};
use uuid::Uuid;

fn transfers(f: &Fixture) -> TransferService {
    TransferService::new(f.store.clone(), 100)
}

fn request(f: &Fixture, item_id: Uuid, quantity: i64) -> RequestTransfer {
    RequestTransfer {
        from_branch_id: f.north.id,
        to_branch_id: f.south.id,
        item: ItemSelector::Id(item_id),
        quantity: dec(quantity),
        notes: "Term two restock".to_string(),
        requested_by: f.actor,
    }
}

async fn south_items(f: &Fixture) -> Vec<shared::models::InventoryItem> {
    f.store
        .list_items(&ItemFilter {
            branch_id: f.south.id,
            ..Default::default()
        })
        .await
        .unwrap()
}

// ============================================================================
// Request
// ============================================================================

#[tokio::test]
async fn test_request_creates_pending_transfer_without_moving_stock() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;

    let transfer = transfers(&f)
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();

    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(transfer.approved_by, None);
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(70));
}

#[tokio::test]
async fn test_request_to_same_branch_is_rejected() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let mut same = request(&f, chalk.id, 10);
    same.to_branch_id = f.north.id;

    let err = transfers(&f).request_transfer(same).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_request_across_institutions_is_rejected() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let mut cross = request(&f, chalk.id, 10);
    cross.to_branch_id = f.foreign.id;

    let err = transfers(&f).request_transfer(cross).await.unwrap_err();
    match err {
        AppError::Validation { message, .. } => {
            assert_eq!(message, "Branches must belong to the same institution")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_request_to_unknown_branch_is_not_found() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let mut unknown = request(&f, chalk.id, 10);
    unknown.to_branch_id = Uuid::new_v4();

    let err = transfers(&f).request_transfer(unknown).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_request_for_item_outside_source_branch_is_rejected() {
    let f = fixture().await;
    let paper = f.item(f.south.id, "Paper", 70).await;

    let err = transfers(&f)
        .request_transfer(request(&f, paper.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_request_above_stock_is_insufficient() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;

    let err = transfers(&f)
        .request_transfer(request(&f, chalk.id, 80))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            available,
            requested,
        } => {
            assert_eq!(available, dec(70));
            assert_eq!(requested, dec(80));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_request_by_name_and_category() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let mut by_name = request(&f, chalk.id, 10);
    by_name.item = ItemSelector::NameAndCategory {
        name: "Chalk".to_string(),
        category: "stationery".to_string(),
    };

    let transfer = transfers(&f).request_transfer(by_name).await.unwrap();
    assert_eq!(transfer.item_id, chalk.id);
}

// ============================================================================
// Approve
// ============================================================================

#[tokio::test]
async fn test_approve_moves_stock_and_creates_destination_item() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();
    let approver = Uuid::new_v4();

    let outcome = service.approve_transfer(transfer.id, approver).await.unwrap();

    assert_eq!(outcome.transfer.status, TransferStatus::Completed);
    assert_eq!(outcome.transfer.approved_by, Some(approver));
    assert!(outcome.transfer.approved_date.is_some());
    assert!(outcome.transfer.completed_date.is_some());
    assert_eq!(outcome.source_item.current_stock, dec(40));
    assert_eq!(outcome.destination_item.current_stock, dec(30));

    let created = south_items(&f).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Chalk");
    assert_eq!(created[0].category, "stationery");
    assert_eq!(created[0].description, chalk.description);
    assert_eq!(created[0].min_quantity, chalk.min_quantity);
    assert_eq!(created[0].unit, "boxes");

    let types: Vec<MovementType> = outcome.movements.iter().map(|m| m.movement_type).collect();
    assert_eq!(types, vec![MovementType::TransferOut, MovementType::TransferIn]);
    assert_eq!(outcome.movements[0].quantity, dec(-30));
    assert_eq!(outcome.movements[1].quantity, dec(30));
    assert!(outcome
        .movements
        .iter()
        .all(|m| m.reference_id == transfer.id));
    assert_eq!(
        outcome.movements[0].notes,
        format!("Transfer to branch {}", f.south.id)
    );
    assert_eq!(
        outcome.movements[1].notes,
        format!("Transfer from branch {}", f.north.id)
    );
}

#[tokio::test]
async fn test_both_branches_reconcile_after_approval() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);

    for quantity in [30, 15] {
        let transfer = service
            .request_transfer(request(&f, chalk.id, quantity))
            .await
            .unwrap();
        service.approve_transfer(transfer.id, f.actor).await.unwrap();
    }

    let destination = south_items(&f).await;
    assert_eq!(destination.len(), 1);
    assert_eq!(destination[0].current_stock, dec(45));
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(25));

    for item in [&chalk, &destination[0]] {
        let movements = f
            .store
            .list_movements(
                &LedgerFilter {
                    item_id: Some(item.id),
                    ..Default::default()
                },
                100,
            )
            .await
            .unwrap();
        assert_eq!(
            ledger_balance(&movements).unwrap(),
            f.stock_of(item.id).await.current_stock
        );
    }

    let reports = ReportingService::new(f.store.clone(), 500);
    for branch_id in [f.north.id, f.south.id] {
        let report = reports.reconciliation(branch_id).await.unwrap();
        assert!(report.balanced, "branch {branch_id} out of balance");
        assert_eq!(report.items.len(), 1);
    }
}

#[tokio::test]
async fn test_approve_credits_existing_destination_item() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let south_chalk = f.item(f.south.id, "Chalk", 5).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();

    let outcome = service.approve_transfer(transfer.id, f.actor).await.unwrap();

    assert_eq!(outcome.destination_item.id, south_chalk.id);
    assert_eq!(f.stock_of(south_chalk.id).await.current_stock, dec(35));
    assert_eq!(south_items(&f).await.len(), 1);
}

#[tokio::test]
async fn test_second_approval_fails_not_pending() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();

    service.approve_transfer(transfer.id, f.actor).await.unwrap();
    let err = service
        .approve_transfer(transfer.id, f.actor)
        .await
        .unwrap_err();

    match err {
        AppError::InvalidStateTransition(message) => {
            assert_eq!(message, "Transfer is not in pending status")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(40));
}

#[tokio::test]
async fn test_approval_after_stock_drift_fails_and_stays_pending() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 70))
        .await
        .unwrap();

    // Stock drops below the requested quantity before approval
    f.adjustments()
        .record_adjustment(RecordAdjustment {
            branch_id: f.north.id,
            item_id: chalk.id,
            quantity: dec(-15),
            reason: AdjustmentReason::Damage,
            description: String::new(),
            adjusted_by: f.actor,
        })
        .await
        .unwrap();

    let err = service
        .approve_transfer(transfer.id, f.actor)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(55));
    let stored = service.get_transfer(transfer.id).await.unwrap();
    assert_eq!(stored.transfer.status, TransferStatus::Pending);
    assert!(south_items(&f).await.is_empty());
}

#[tokio::test]
async fn test_failed_approval_commit_rolls_back_and_can_be_resubmitted() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();

    f.memory.fail_next_commit();
    let err = service
        .approve_transfer(transfer.id, f.actor)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(70));
    assert!(south_items(&f).await.is_empty());
    let stored = service.get_transfer(transfer.id).await.unwrap();
    assert_eq!(stored.transfer.status, TransferStatus::Pending);
    let transfer_movements = f
        .store
        .list_movements(&LedgerFilter::default(), 100)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.reference_id == transfer.id)
        .count();
    assert_eq!(transfer_movements, 0);

    let outcome = service.approve_transfer(transfer.id, f.actor).await.unwrap();
    assert_eq!(outcome.source_item.current_stock, dec(40));
}

// ============================================================================
// Reject & Listing
// ============================================================================

#[tokio::test]
async fn test_reject_never_changes_stock() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let transfer = service
        .request_transfer(request(&f, chalk.id, 30))
        .await
        .unwrap();
    let rejecter = Uuid::new_v4();

    let rejected = service.reject_transfer(transfer.id, rejecter).await.unwrap();

    assert_eq!(rejected.status, TransferStatus::Rejected);
    assert_eq!(rejected.approved_by, Some(rejecter));
    assert_eq!(f.stock_of(chalk.id).await.current_stock, dec(70));

    let again = service.approve_transfer(transfer.id, f.actor).await;
    assert!(matches!(again, Err(AppError::InvalidStateTransition(_))));
    let again = service.reject_transfer(transfer.id, f.actor).await;
    assert!(matches!(again, Err(AppError::InvalidStateTransition(_))));
}

#[tokio::test]
async fn test_unknown_transfer_is_not_found() {
    let f = fixture().await;
    let err = transfers(&f)
        .approve_transfer(Uuid::new_v4(), f.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_listing_covers_both_sides_and_filters_status() {
    let f = fixture().await;
    let chalk = f.item(f.north.id, "Chalk", 70).await;
    let service = transfers(&f);
    let first = service
        .request_transfer(request(&f, chalk.id, 10))
        .await
        .unwrap();
    service
        .request_transfer(request(&f, chalk.id, 20))
        .await
        .unwrap();
    service.reject_transfer(first.id, f.actor).await.unwrap();

    let incoming = service
        .list_transfers(&TransferFilter {
            branch_id: f.south.id,
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(incoming.len(), 2);
    assert_eq!(incoming[0].item.as_ref().unwrap().name, "Chalk");

    let pending = service
        .list_transfers(&TransferFilter {
            branch_id: f.north.id,
            status: Some(TransferStatus::Pending),
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].transfer.quantity, dec(20));
}
