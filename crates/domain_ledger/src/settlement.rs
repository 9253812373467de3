//! Settlement Processor
//!
//! Applies credit payments to open invoices. The invoice row is locked for
//! the duration of the unit, so concurrent payments on one invoice are
//! applied one after another and cumulative credit can never pass the total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, Money};

use crate::debt::CustomerDebtAggregator;
use crate::error::LedgerError;
use crate::expenditure::ExpenditureEntry;
use crate::invoice::InvoiceNumber;
use crate::payment::{installment_note, CreditPayment, CreditPaymentReceipt, SETTLED_NOTE};
use crate::ports::{LedgerStore, LedgerUnit};
use crate::transaction::{Direction, PaymentStatus};
use crate::unit::finish;

/// Effect of one payment on an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    /// Credit applied including this payment
    pub cumulative: Money,
    /// Debt left on the invoice
    pub debt: Money,
    pub status: PaymentStatus,
}

impl SettlementOutcome {
    /// Evaluates a payment of `amount` on top of `prior_credit`
    pub fn assess(total: Money, prior_credit: Money, amount: Money) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation("payment amount must be greater than zero"));
        }

        let cumulative = prior_credit.checked_add(&amount)?;
        if cumulative > total {
            return Err(LedgerError::AmountExceedsTotal {
                amount,
                remaining: total.checked_sub(&prior_credit)?,
            });
        }

        Ok(Self {
            cumulative,
            debt: total.checked_sub(&cumulative)?,
            status: PaymentStatus::for_amounts(cumulative, total),
        })
    }

    /// Note for the payment: settled, or the ordinal of the installment
    pub fn note(&self, prior_payments: u32) -> String {
        if self.status.is_paid() {
            SETTLED_NOTE.to_string()
        } else {
            installment_note(prior_payments.saturating_add(1))
        }
    }
}

/// Applies credit payments
#[derive(Clone)]
pub struct SettlementProcessor {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    debts: CustomerDebtAggregator,
}

impl SettlementProcessor {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        let debts = CustomerDebtAggregator::new(store.clone());
        Self { store, clock, debts }
    }

    /// Applies a payment of `amount` to the transaction behind `invoice_number`
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed invoice number, a non-positive amount or
    ///   a missing creator
    /// - `NotFound` when no transaction carries the invoice number
    /// - `Conflict` when the invoice is already paid
    /// - `AmountExceedsTotal` when cumulative credit would pass the total
    /// - `Internal` when the store fails
    #[instrument(skip(self, amount), fields(amount = %amount))]
    pub async fn apply_credit_payment(
        &self,
        invoice_number: &str,
        amount: rust_decimal::Decimal,
        created_by: &str,
    ) -> Result<CreditPaymentReceipt, LedgerError> {
        invoice_number.parse::<InvoiceNumber>()?;
        if created_by.trim().is_empty() {
            return Err(LedgerError::validation("creator is required"));
        }
        let amount = Money::new(amount);
        if !amount.is_positive() {
            return Err(LedgerError::validation("payment amount must be greater than zero"));
        }

        let mut unit = self.store.begin().await?;
        let now = self.clock.now();
        let outcome = self
            .settle(unit.as_mut(), invoice_number, amount, created_by, now)
            .await;
        let receipt = finish(unit, outcome).await.map_err(|e| {
            warn!(error = %e, "Credit payment failed");
            e
        })?;

        info!(
            notes = %receipt.payment.notes,
            payment_amount = %receipt.transaction.payment_amount,
            debt = %receipt.transaction.debt,
            status = %receipt.transaction.payment_status,
            "Credit payment applied"
        );

        Ok(receipt)
    }

    async fn settle(
        &self,
        unit: &mut dyn LedgerUnit,
        invoice_number: &str,
        amount: Money,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<CreditPaymentReceipt, LedgerError> {
        let transaction = unit
            .transaction_by_invoice(invoice_number)
            .await
            .map_err(|e| LedgerError::from(e).with_entity("Invoice"))?;

        if transaction.payment_status.is_paid() {
            return Err(LedgerError::conflict(format!(
                "invoice {} is already paid",
                invoice_number
            )));
        }

        let prior_payments = unit.count_credit_payments(invoice_number).await?;
        let prior_credit = unit.sum_credit_payments(invoice_number).await?;
        let outcome = SettlementOutcome::assess(transaction.total, prior_credit, amount)?;

        let payment = CreditPayment::new(
            invoice_number,
            amount,
            self.clock.today(),
            outcome.note(prior_payments),
            created_by,
            now,
        );

        unit.insert_credit_payment(&payment).await?;
        unit.update_payment_amount(transaction.id, outcome.cumulative, created_by)
            .await?;
        unit.update_debt(transaction.id, outcome.debt).await?;
        if outcome.status != transaction.payment_status {
            unit.update_payment_status(transaction.id, outcome.status, created_by)
                .await?;
        }

        self.debts.apply(unit, transaction.customer_id, -amount).await?;

        if transaction.direction == Direction::Inbound {
            unit.insert_expenditure(&ExpenditureEntry::credit_payment(&payment, now))
                .await?;
        }

        let transaction = unit.transaction_by_invoice(invoice_number).await?;

        Ok(CreditPaymentReceipt {
            transaction,
            payment,
        })
    }
}

impl std::fmt::Debug for SettlementProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementProcessor")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount)
    }

    #[test]
    fn test_partial_payment_stays_unpaid() {
        let outcome = SettlementOutcome::assess(money(dec!(100)), money(dec!(40)), money(dec!(30))).unwrap();
        assert_eq!(outcome.cumulative, money(dec!(70)));
        assert_eq!(outcome.debt, money(dec!(30)));
        assert_eq!(outcome.status, PaymentStatus::Unpaid);
        assert_eq!(outcome.note(1), "2nd Installment");
    }

    #[test]
    fn test_exact_remaining_settles() {
        let outcome = SettlementOutcome::assess(money(dec!(100)), money(dec!(40)), money(dec!(60))).unwrap();
        assert!(outcome.debt.is_zero());
        assert_eq!(outcome.status, PaymentStatus::Paid);
        assert_eq!(outcome.note(1), "Settled");
    }

    #[test]
    fn test_overpayment_reports_remaining() {
        let err = SettlementOutcome::assess(money(dec!(100)), money(dec!(40)), money(dec!(61))).unwrap_err();
        match err {
            LedgerError::AmountExceedsTotal { amount, remaining } => {
                assert_eq!(amount, money(dec!(61)));
                assert_eq!(remaining, money(dec!(60)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_amount_rejected() {
        let err = SettlementOutcome::assess(money(dec!(100)), money(dec!(0)), money(dec!(0))).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
