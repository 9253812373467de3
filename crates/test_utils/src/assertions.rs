//! Custom Test Assertions
//!
//! Checks the ledger's coupled invariants over a whole store snapshot and
//! compares snapshots taken before and after a failed operation.

use rust_decimal::Decimal;
use std::fmt::Debug;

use core_kernel::Money;
use domain_ledger::{ErrorKind, InMemoryLedgerStore, LedgerError, LedgerState, PaymentStatus};

/// Asserts that a result failed with the given error kind
pub fn assert_error_kind<T: Debug>(result: &Result<T, LedgerError>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", expected, value),
        Err(err) => assert_eq!(
            err.kind(),
            expected,
            "Expected {:?} error, got {:?}: {}",
            expected,
            err.kind(),
            err
        ),
    }
}

/// Asserts every ledger invariant over the committed state
///
/// - each transaction's total equals the sum of its line totals
/// - no item has negative stock
/// - each transaction's payment amount equals the sum of its credit records
///   and never exceeds its total
/// - status is paid exactly when the payment amount reaches the total
/// - each transaction's debt equals total minus payment amount
/// - each customer's debt equals the outstanding debt of their active
///   transactions
pub fn assert_ledger_consistent(state: &LedgerState) {
    for transaction in &state.transactions {
        let line_sum: Money = transaction.line_items.iter().map(|l| l.total).sum();
        assert_eq!(
            transaction.total, line_sum,
            "{}: total does not equal the sum of line totals",
            transaction.invoice_number
        );

        let credited: Money = state
            .payments_for(&transaction.invoice_number)
            .into_iter()
            .map(|p| p.amount)
            .sum();
        assert_eq!(
            transaction.payment_amount, credited,
            "{}: payment amount does not equal applied credit",
            transaction.invoice_number
        );
        assert!(
            transaction.payment_amount <= transaction.total,
            "{}: credit {} exceeds total {}",
            transaction.invoice_number,
            transaction.payment_amount,
            transaction.total
        );

        let expected_status = if transaction.payment_amount == transaction.total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        };
        assert_eq!(
            transaction.payment_status, expected_status,
            "{}: payment status out of step with credit",
            transaction.invoice_number
        );

        assert_eq!(
            transaction.debt,
            transaction.total - transaction.payment_amount,
            "{}: debt is not total minus payment",
            transaction.invoice_number
        );
    }

    for item in state.items.values() {
        assert!(
            item.stock >= Decimal::ZERO,
            "{}: negative stock {}",
            item.name,
            item.stock
        );
    }

    for customer in state.customers.values() {
        assert_eq!(
            customer.debt,
            state.outstanding_debt(customer.id),
            "{}: stored debt differs from outstanding transaction debt",
            customer.full_name
        );
    }
}

/// Committed state captured before an operation
#[derive(Debug, Clone)]
pub struct StoreSnapshot(LedgerState);

impl StoreSnapshot {
    pub async fn capture(store: &InMemoryLedgerStore) -> Self {
        Self(store.snapshot().await)
    }

    /// Asserts the store has not changed since capture
    pub async fn assert_unchanged(&self, store: &InMemoryLedgerStore) {
        let current = store.snapshot().await;
        assert_eq!(
            current.transactions.len(),
            self.0.transactions.len(),
            "transaction count changed"
        );
        assert_eq!(
            current.credit_payments.len(),
            self.0.credit_payments.len(),
            "credit payment count changed"
        );
        assert_eq!(
            current.expenditures.len(),
            self.0.expenditures.len(),
            "expenditure count changed"
        );
        assert_eq!(current, self.0, "store state changed");
    }

    pub fn state(&self) -> &LedgerState {
        &self.0
    }
}
