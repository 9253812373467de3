//! Test Data Builders
//!
//! Builds transaction requests with sensible defaults so tests only spell
//! out the fields they care about.

use rust_decimal::Decimal;

use core_kernel::{CustomerId, ItemId};
use domain_ledger::{CreateTransactionRequest, InventoryItem, LineRequest};

/// Builder for [`CreateTransactionRequest`]
#[derive(Debug, Clone)]
pub struct TransactionRequestBuilder {
    direction: String,
    customer_id: CustomerId,
    created_by: String,
    lines: Vec<LineRequest>,
    payment_amount: Decimal,
}

impl TransactionRequestBuilder {
    /// Starts a request with a raw direction string
    pub fn new(direction: impl Into<String>, customer_id: CustomerId) -> Self {
        Self {
            direction: direction.into(),
            customer_id,
            created_by: "test-clerk".to_string(),
            lines: Vec::new(),
            payment_amount: Decimal::ZERO,
        }
    }

    pub fn inbound(customer_id: CustomerId) -> Self {
        Self::new("inbound", customer_id)
    }

    pub fn outbound(customer_id: CustomerId) -> Self {
        Self::new("outbound", customer_id)
    }

    /// Adds a line for `item`
    pub fn line(self, item: &InventoryItem, quantity: Decimal, price: Decimal) -> Self {
        self.line_for(item.id, quantity, price)
    }

    /// Adds a line by item id, which need not exist
    pub fn line_for(mut self, item_id: ItemId, quantity: Decimal, price: Decimal) -> Self {
        self.lines.push(LineRequest {
            item_id,
            quantity,
            price,
        });
        self
    }

    /// Sets the opening payment
    pub fn payment(mut self, amount: Decimal) -> Self {
        self.payment_amount = amount;
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn build(self) -> CreateTransactionRequest {
        CreateTransactionRequest {
            direction: self.direction,
            customer_id: self.customer_id,
            created_by: self.created_by,
            lines: self.lines,
            payment_amount: self.payment_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_collects_lines() {
        let request = TransactionRequestBuilder::outbound(CustomerId::new())
            .line_for(ItemId::new(), dec!(2), dec!(15))
            .line_for(ItemId::new(), dec!(1), dec!(70))
            .payment(dec!(40))
            .build();

        assert_eq!(request.direction, "outbound");
        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.payment_amount, dec!(40));
        assert_eq!(request.created_by, "test-clerk");
    }
}
