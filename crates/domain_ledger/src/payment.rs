//! Credit payments applied against an invoice

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CreditPaymentId, Money};

use crate::transaction::Transaction;

/// Note on the payment that brings an invoice to its full total
pub const SETTLED_NOTE: &str = "Settled";

/// Note on an opening payment that leaves a balance
pub const DOWN_PAYMENT_NOTE: &str = "Down Payment";

/// One payment toward an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPayment {
    pub id: CreditPaymentId,
    pub invoice_number: String,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl CreditPayment {
    pub fn new(
        invoice_number: impl Into<String>,
        amount: Money,
        payment_date: NaiveDate,
        notes: impl Into<String>,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CreditPaymentId::new_v7(),
            invoice_number: invoice_number.into(),
            amount,
            payment_date,
            notes: notes.into(),
            created_at: now,
            created_by: created_by.to_string(),
            updated_at: now,
            updated_by: created_by.to_string(),
        }
    }

    /// The payment recorded when a transaction is created
    pub fn opening(transaction: &Transaction, now: DateTime<Utc>) -> Self {
        let notes = if transaction.payment_status.is_paid() {
            SETTLED_NOTE
        } else {
            DOWN_PAYMENT_NOTE
        };

        Self::new(
            transaction.invoice_number.clone(),
            transaction.payment_amount,
            transaction.date,
            notes,
            &transaction.created_by,
            now,
        )
    }
}

/// Result of applying a credit payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPaymentReceipt {
    pub transaction: Transaction,
    pub payment: CreditPayment,
}

/// Note for the `ordinal`-th payment on an invoice that does not settle it
pub fn installment_note(ordinal: u32) -> String {
    format!("{}{} Installment", ordinal, ordinal_suffix(ordinal))
}

fn ordinal_suffix(n: u32) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
