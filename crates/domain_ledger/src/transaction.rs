//! Transaction header and line items

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CustomerId, ItemId, LineItemId, Money, TransactionId};

use crate::error::LedgerError;
use crate::inventory::InventoryItem;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Stock bought from a supplier
    Inbound,
    /// Stock sold to a customer
    Outbound,
}

impl Direction {
    /// Invoice prefix for this direction
    pub fn invoice_prefix(&self) -> &'static str {
        match self {
            Direction::Inbound => "MJP",
            Direction::Outbound => "INV",
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbound" | "in" => Ok(Direction::Inbound),
            "outbound" | "out" => Ok(Direction::Outbound),
            other => Err(LedgerError::validation(format!(
                "unknown transaction direction '{}'",
                other
            ))),
        }
    }
}

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    /// Status implied by a cumulative payment against a total
    pub fn for_amounts(paid: Money, total: Money) -> Self {
        if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Status only ever moves forward
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Unpaid, _) | (PaymentStatus::Paid, PaymentStatus::Paid)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer details copied onto the transaction at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub company_name: String,
}

/// One line of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    /// Item name at the time of the transaction
    pub item_name: String,
    pub quantity: Decimal,
    pub price: Money,
    /// price x quantity
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl LineItem {
    /// Builds a line for `item`, rejecting non-positive quantity or price
    pub fn new(
        transaction_id: TransactionId,
        item: &InventoryItem,
        quantity: Decimal,
        price: Money,
        created_by: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "quantity for {} must be greater than zero",
                item.name
            )));
        }
        if !price.is_positive() {
            return Err(LedgerError::validation(format!(
                "price for {} must be greater than zero",
                item.name
            )));
        }

        let total = price.checked_mul(quantity)?;

        Ok(Self {
            id: LineItemId::new_v7(),
            transaction_id,
            item_id: item.id,
            item_name: item.name.clone(),
            quantity,
            price,
            total,
            created_at,
            created_by: created_by.to_string(),
        })
    }
}

/// Payment status and outstanding debt when a transaction is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningBalance {
    pub status: PaymentStatus,
    pub debt: Money,
}

impl OpeningBalance {
    /// Evaluates an opening payment against the transaction total
    pub fn assess(total: Money, payment: Money) -> Result<Self, LedgerError> {
        if payment.is_negative() {
            return Err(LedgerError::validation("payment amount cannot be negative"));
        }
        if payment > total {
            return Err(LedgerError::AmountExceedsTotal {
                amount: payment,
                remaining: total,
            });
        }

        Ok(Self {
            status: PaymentStatus::for_amounts(payment, total),
            debt: total.checked_sub(&payment)?,
        })
    }
}

/// A recorded stock movement with its settlement state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Business date the transaction was created on
    pub date: NaiveDate,
    pub invoice_number: String,
    pub direction: Direction,
    pub customer_id: CustomerId,
    pub customer: CustomerSnapshot,
    pub line_items: Vec<LineItem>,
    pub total: Money,
    /// Cumulative credit applied so far
    pub payment_amount: Money,
    /// total - payment_amount
    pub debt: Money,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount still owed on this transaction
    pub fn remaining(&self) -> Result<Money, LedgerError> {
        Ok(self.total.checked_sub(&self.payment_amount)?)
    }

    pub fn is_settled(&self) -> bool {
        self.payment_status.is_paid()
    }

    /// Sum of line totals
    pub fn line_total_sum(&self) -> Result<Money, LedgerError> {
        Ok(Money::checked_sum(self.line_items.iter().map(|l| &l.total))?)
    }

    /// Names of the items on this transaction, in line order
    pub fn item_names(&self) -> Vec<&str> {
        self.line_items.iter().map(|l| l.item_name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    mod direction_tests {
        use super::*;

        #[test]
        fn test_parse_accepts_short_and_long_forms() {
            assert_eq!("inbound".parse::<Direction>().unwrap(), Direction::Inbound);
            assert_eq!(" IN ".parse::<Direction>().unwrap(), Direction::Inbound);
            assert_eq!("out".parse::<Direction>().unwrap(), Direction::Outbound);
            assert_eq!("Outbound".parse::<Direction>().unwrap(), Direction::Outbound);
        }

        #[test]
        fn test_parse_rejects_unknown() {
            let err = "sideways".parse::<Direction>().unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }

        #[test]
        fn test_invoice_prefixes() {
            assert_eq!(Direction::Inbound.invoice_prefix(), "MJP");
            assert_eq!(Direction::Outbound.invoice_prefix(), "INV");
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_for_amounts() {
            let total = Money::new(dec!(100));
            assert_eq!(PaymentStatus::for_amounts(Money::new(dec!(40)), total), PaymentStatus::Unpaid);
            assert_eq!(PaymentStatus::for_amounts(total, total), PaymentStatus::Paid);
        }

        #[test]
        fn test_paid_never_reverts() {
            assert!(PaymentStatus::Unpaid.can_transition_to(PaymentStatus::Paid));
            assert!(PaymentStatus::Unpaid.can_transition_to(PaymentStatus::Unpaid));
            assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Unpaid));
        }
    }

    mod opening_balance_tests {
        use super::*;

        #[test]
        fn test_partial_payment_leaves_debt() {
            let balance = OpeningBalance::assess(Money::new(dec!(100)), Money::new(dec!(40))).unwrap();
            assert_eq!(balance.status, PaymentStatus::Unpaid);
            assert_eq!(balance.debt, Money::new(dec!(60)));
        }

        #[test]
        fn test_full_payment_is_paid() {
            let balance = OpeningBalance::assess(Money::new(dec!(100)), Money::new(dec!(100))).unwrap();
            assert_eq!(balance.status, PaymentStatus::Paid);
            assert!(balance.debt.is_zero());
        }

        #[test]
        fn test_overpayment_rejected() {
            let err = OpeningBalance::assess(Money::new(dec!(100)), Money::new(dec!(100.01))).unwrap_err();
            assert!(matches!(err, LedgerError::AmountExceedsTotal { .. }));
        }

        #[test]
        fn test_negative_payment_rejected() {
            let err = OpeningBalance::assess(Money::new(dec!(100)), Money::new(dec!(-1))).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
    }

    mod line_item_tests {
        use super::*;

        fn cement_line(quantity: Decimal, price: Decimal) -> Result<LineItem, LedgerError> {
            let cement = InventoryItem::new("Cement", Money::new(dec!(15)), dec!(10), Utc::now());
            LineItem::new(
                TransactionId::new(),
                &cement,
                quantity,
                Money::new(price),
                "clerk",
                Utc::now(),
            )
        }

        #[test]
        fn test_total_is_price_times_quantity() {
            let line = cement_line(dec!(2.5), dec!(15)).unwrap();
            assert_eq!(line.total, Money::new(dec!(37.5)));
            assert_eq!(line.item_name, "Cement");
        }

        #[test]
        fn test_zero_quantity_rejected() {
            let err = cement_line(dec!(0), dec!(15)).unwrap_err();
            assert!(err.to_string().contains("quantity for Cement"));
        }

        #[test]
        fn test_negative_price_rejected() {
            let err = cement_line(dec!(1), dec!(-3)).unwrap_err();
            assert!(err.to_string().contains("price for Cement"));
        }
    }

    mod remaining_tests {
        use super::*;

        #[test]
        fn test_remaining_is_total_minus_payment() {
            let now = Utc::now();
            let transaction = Transaction {
                id: TransactionId::new(),
                date: now.date_naive(),
                invoice_number: "INV-20240309-0000".to_string(),
                direction: Direction::Outbound,
                customer_id: CustomerId::new(),
                customer: CustomerSnapshot {
                    name: "Budi".to_string(),
                    address: String::new(),
                    phone_number: String::new(),
                    company_name: "Toko Maju".to_string(),
                },
                line_items: Vec::new(),
                total: Money::new(dec!(100)),
                payment_amount: Money::new(dec!(40)),
                debt: Money::new(dec!(60)),
                payment_status: PaymentStatus::Unpaid,
                is_active: true,
                created_by: "clerk".to_string(),
                updated_by: "clerk".to_string(),
                created_at: now,
                updated_at: now,
            };

            assert_eq!(transaction.remaining().unwrap(), Money::new(dec!(60)));
        }
    }
}
