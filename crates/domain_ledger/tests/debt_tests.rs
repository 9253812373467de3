//! Customer Debt Aggregator Tests

use rust_decimal_macros::dec;

use core_kernel::{CustomerId, Money};
use domain_ledger::ErrorKind;
use test_utils::{assert_error_kind, assert_ledger_consistent, LedgerFixture, TransactionRequestBuilder};

#[tokio::test]
async fn test_reconcile_is_a_no_op_on_a_consistent_ledger() {
    let fixture = LedgerFixture::new().await;
    let cement = fixture.add_item("Cement", dec!(50)).await;
    fixture
        .engine()
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(3), dec!(10))
                .payment(dec!(5))
                .build(),
        )
        .await
        .unwrap();

    let reconciliation = fixture.aggregator().reconcile(fixture.customer.id).await.unwrap();

    assert!(!reconciliation.corrected());
    assert_eq!(reconciliation.reconciled, Money::new(dec!(25)));
    assert_eq!(fixture.customer_debt().await, Money::new(dec!(25)));
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_debt() {
    let fixture = LedgerFixture::new().await;
    let cement = fixture.add_item("Cement", dec!(50)).await;
    fixture
        .engine()
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(2), dec!(10))
                .build(),
        )
        .await
        .unwrap();
    fixture
        .store
        .corrupt_customer_debt(fixture.customer.id, Money::new(dec!(999)))
        .await;

    let reconciliation = fixture.aggregator().reconcile(fixture.customer.id).await.unwrap();

    assert!(reconciliation.corrected());
    assert_eq!(reconciliation.previous, Money::new(dec!(999)));
    assert_eq!(reconciliation.reconciled, Money::new(dec!(20)));
    assert_ledger_consistent(&fixture.store.snapshot().await);
}

#[tokio::test]
async fn test_reconcile_ignores_inactive_transactions() {
    let fixture = LedgerFixture::new().await;
    let cement = fixture.add_item("Cement", dec!(50)).await;
    let engine = fixture.engine();

    let kept = engine
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(1), dec!(10))
                .build(),
        )
        .await
        .unwrap();
    let voided = engine
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(4), dec!(10))
                .build(),
        )
        .await
        .unwrap();
    fixture.store.deactivate_transaction(voided.id).await;

    let reconciliation = fixture.aggregator().reconcile(fixture.customer.id).await.unwrap();

    assert_eq!(reconciliation.previous, Money::new(dec!(50)));
    assert_eq!(reconciliation.reconciled, kept.debt);
}

#[tokio::test]
async fn test_debts_of_different_customers_are_independent() {
    let fixture = LedgerFixture::new().await;
    let other = fixture.add_customer().await;
    let cement = fixture.add_item("Cement", dec!(50)).await;
    let engine = fixture.engine();

    for (customer_id, qty) in [(fixture.customer.id, dec!(1)), (other.id, dec!(3))] {
        engine
            .create_transaction(
                TransactionRequestBuilder::outbound(customer_id)
                    .line(&cement, qty, dec!(10))
                    .build(),
            )
            .await
            .unwrap();
    }

    let state = fixture.store.snapshot().await;
    assert_eq!(state.customers[&fixture.customer.id].debt, Money::new(dec!(10)));
    assert_eq!(state.customers[&other.id].debt, Money::new(dec!(30)));
    assert_ledger_consistent(&state);
}

#[tokio::test]
async fn test_reconcile_unknown_customer_is_not_found() {
    let fixture = LedgerFixture::new().await;

    assert_error_kind(
        &fixture.aggregator().reconcile(CustomerId::new()).await,
        ErrorKind::NotFound,
    );
}
