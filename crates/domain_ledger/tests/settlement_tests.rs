//! Settlement Processor Tests
//!
//! Credit payments against open invoices: cumulative credit, installment
//! notes, settlement, overpayment and the expenditure mirror for inbound
//! purchases.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_ledger::{ErrorKind, LedgerError, PaymentStatus, Transaction};
use test_utils::{
    assert_error_kind, assert_ledger_consistent, business_date, LedgerFixture, StoreSnapshot,
    TransactionRequestBuilder,
};

/// Creates an outbound invoice of 100 with the given opening payment
async fn open_invoice(fixture: &LedgerFixture, opening: Decimal) -> Transaction {
    let cement = fixture.add_item("Cement", dec!(100)).await;
    fixture
        .engine()
        .create_transaction(
            TransactionRequestBuilder::outbound(fixture.customer.id)
                .line(&cement, dec!(4), dec!(25))
                .payment(opening)
                .build(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_installment_reduces_debt() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(40)).await;

    let receipt = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(30), "siti")
        .await
        .unwrap();

    assert_eq!(receipt.transaction.payment_amount, Money::new(dec!(70)));
    assert_eq!(receipt.transaction.debt, Money::new(dec!(30)));
    assert_eq!(receipt.transaction.payment_status, PaymentStatus::Unpaid);
    assert_eq!(receipt.transaction.updated_by, "siti");
    assert_eq!(receipt.payment.amount, Money::new(dec!(30)));
    assert_eq!(receipt.payment.notes, "2nd Installment");
    assert_eq!(receipt.payment.payment_date, business_date());
    assert_eq!(fixture.customer_debt().await, Money::new(dec!(30)));
    assert_ledger_consistent(&fixture.store.snapshot().await);
}

#[tokio::test]
async fn test_installments_count_up_and_final_payment_settles() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;
    let settlement = fixture.settlement();

    let mut notes = Vec::new();
    for amount in [dec!(10), dec!(20), dec!(30), dec!(40)] {
        let receipt = settlement
            .apply_credit_payment(&tx.invoice_number, amount, "siti")
            .await
            .unwrap();
        notes.push(receipt.payment.notes);
    }

    assert_eq!(
        notes,
        vec!["2nd Installment", "3rd Installment", "4th Installment", "Settled"]
    );

    let settled = fixture
        .queries()
        .transaction_by_invoice_number(&tx.invoice_number)
        .await
        .unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert!(settled.debt.is_zero());
    assert!(fixture.customer_debt().await.is_zero());
    assert_ledger_consistent(&fixture.store.snapshot().await);
}

#[tokio::test]
async fn test_exact_remaining_settles() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(40)).await;

    let receipt = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(60), "siti")
        .await
        .unwrap();

    assert_eq!(receipt.payment.notes, "Settled");
    assert_eq!(receipt.transaction.payment_status, PaymentStatus::Paid);
    assert!(receipt.transaction.debt.is_zero());
}

#[tokio::test]
async fn test_overpayment_is_rejected_without_side_effects() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(40)).await;
    let before = StoreSnapshot::capture(&fixture.store).await;

    let result = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(60.01), "siti")
        .await;

    match result {
        Err(LedgerError::AmountExceedsTotal { amount, remaining }) => {
            assert_eq!(amount, Money::new(dec!(60.01)));
            assert_eq!(remaining, Money::new(dec!(60)));
        }
        other => panic!("expected amount exceeds total, got {:?}", other),
    }
    before.assert_unchanged(&fixture.store).await;
}

#[tokio::test]
async fn test_paid_invoice_rejects_further_payment() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(100)).await;
    let before = StoreSnapshot::capture(&fixture.store).await;

    let result = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(1), "siti")
        .await;

    assert_error_kind(&result, ErrorKind::Conflict);
    before.assert_unchanged(&fixture.store).await;
}

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let fixture = LedgerFixture::new().await;

    let result = fixture
        .settlement()
        .apply_credit_payment("INV-20240309-0042", dec!(10), "siti")
        .await;

    match result {
        Err(LedgerError::NotFound { entity, key }) => {
            assert_eq!(entity, "Invoice");
            assert_eq!(key, "INV-20240309-0042");
        }
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_voided_invoice_accepts_no_payment() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;
    fixture.engine().void_transaction(tx.id, "admin").await.unwrap();
    let before = StoreSnapshot::capture(&fixture.store).await;

    let result = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(30), "siti")
        .await;

    match result {
        Err(LedgerError::NotFound { entity, key }) => {
            assert_eq!(entity, "Invoice");
            assert_eq!(key, tx.invoice_number);
        }
        other => panic!("expected not found, got {:?}", other),
    }
    before.assert_unchanged(&fixture.store).await;
    assert!(fixture.customer_debt().await.is_zero());
}

#[tokio::test]
async fn test_deactivated_invoice_accepts_no_payment() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;
    fixture.store.deactivate_transaction(tx.id).await;
    let before = StoreSnapshot::capture(&fixture.store).await;

    let result = fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(30), "siti")
        .await;

    assert_error_kind(&result, ErrorKind::NotFound);
    before.assert_unchanged(&fixture.store).await;
    assert_eq!(fixture.store.snapshot().await.payments_for(&tx.invoice_number).len(), 1);
}

#[tokio::test]
async fn test_malformed_invoice_is_rejected() {
    let fixture = LedgerFixture::new().await;

    let result = fixture
        .settlement()
        .apply_credit_payment("INV-2024-1", dec!(10), "siti")
        .await;

    assert_error_kind(&result, ErrorKind::Validation);
}

#[tokio::test]
async fn test_non_positive_amount_and_missing_creator_are_rejected() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;
    let settlement = fixture.settlement();

    assert_error_kind(
        &settlement.apply_credit_payment(&tx.invoice_number, dec!(0), "siti").await,
        ErrorKind::Validation,
    );
    assert_error_kind(
        &settlement.apply_credit_payment(&tx.invoice_number, dec!(-5), "siti").await,
        ErrorKind::Validation,
    );
    assert_error_kind(
        &settlement.apply_credit_payment(&tx.invoice_number, dec!(5), "  ").await,
        ErrorKind::Validation,
    );
}

#[tokio::test]
async fn test_inbound_payment_is_mirrored_to_expenditures() {
    let fixture = LedgerFixture::new().await;
    let cement = fixture.add_item("Cement", dec!(0)).await;
    let tx = fixture
        .engine()
        .create_transaction(
            TransactionRequestBuilder::inbound(fixture.customer.id)
                .line(&cement, dec!(10), dec!(10))
                .payment(dec!(25))
                .build(),
        )
        .await
        .unwrap();

    fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(75), "siti")
        .await
        .unwrap();

    let state = fixture.store.snapshot().await;
    let entries = state.expenditures_for(&tx.invoice_number);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].amount, Money::new(dec!(75)));
    assert_eq!(
        entries[1].description,
        format!("Settled for {}", tx.invoice_number)
    );
}

#[tokio::test]
async fn test_outbound_payment_writes_no_expenditure() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;

    fixture
        .settlement()
        .apply_credit_payment(&tx.invoice_number, dec!(10), "siti")
        .await
        .unwrap();

    assert!(fixture.store.snapshot().await.expenditures.is_empty());
}

#[tokio::test]
async fn test_concurrent_payments_never_exceed_total() {
    let fixture = LedgerFixture::new().await;
    let tx = open_invoice(&fixture, dec!(0)).await;
    let settlement = fixture.settlement();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let settlement = settlement.clone();
            let invoice = tx.invoice_number.clone();
            tokio::spawn(async move {
                settlement.apply_credit_payment(&invoice, dec!(30), "siti").await
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            applied += 1;
        }
    }

    // 3 x 30 fits in 100; a fourth would need 120
    assert_eq!(applied, 3);
    let state = fixture.store.snapshot().await;
    let settled = state.transaction_by_invoice(&tx.invoice_number).unwrap();
    assert_eq!(settled.payment_amount, Money::new(dec!(90)));
    assert_ledger_consistent(&state);
}
