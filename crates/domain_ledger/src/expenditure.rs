//! Daily expenditure entries
//!
//! Money paid out on inbound purchases is written to the expenditure log,
//! both when stock arrives and for every later installment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ExpenditureId, Money};

use crate::payment::CreditPayment;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureEntry {
    pub id: ExpenditureId,
    /// Invoice number the expense belongs to
    pub reference: String,
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl ExpenditureEntry {
    /// Entry for the opening payment of an inbound transaction
    pub fn stock_in(transaction: &Transaction, now: DateTime<Utc>) -> Self {
        Self {
            id: ExpenditureId::new_v7(),
            reference: transaction.invoice_number.clone(),
            amount: transaction.payment_amount,
            description: format!("Stock in {}", transaction.item_names().join(",")),
            date: transaction.date,
            is_active: true,
            created_at: now,
            created_by: transaction.created_by.clone(),
        }
    }

    /// Entry for a later credit payment on an inbound transaction
    pub fn credit_payment(payment: &CreditPayment, now: DateTime<Utc>) -> Self {
        Self {
            id: ExpenditureId::new_v7(),
            reference: payment.invoice_number.clone(),
            amount: payment.amount,
            description: format!("{} for {}", payment.notes, payment.invoice_number),
            date: payment.payment_date,
            is_active: true,
            created_at: now,
            created_by: payment.created_by.clone(),
        }
    }
}
