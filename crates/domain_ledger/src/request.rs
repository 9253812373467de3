//! Inbound requests

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{CustomerId, ItemId};

use crate::error::LedgerError;

/// One requested line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub quantity: Decimal,
    /// Unit price for this transaction
    pub price: Decimal,
}

/// Request to create a transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// `inbound`/`in` or `outbound`/`out`
    pub direction: String,
    pub customer_id: CustomerId,
    #[validate(length(min = 1, message = "creator is required"))]
    pub created_by: String,
    #[validate(length(min = 1, message = "at least one line item is required"))]
    pub lines: Vec<LineRequest>,
    /// Opening payment
    #[serde(default)]
    pub payment_amount: Decimal,
}

impl CreateTransactionRequest {
    /// Checks request shape and the opening payment
    ///
    /// Per-line quantity and price are checked once each line's item has
    /// been resolved, see [`crate::LineItem::new`].
    pub fn check(&self) -> Result<(), LedgerError> {
        self.validate()?;

        if self.payment_amount < Decimal::ZERO {
            return Err(LedgerError::validation("payment amount cannot be negative"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> CreateTransactionRequest {
        CreateTransactionRequest {
            direction: "outbound".to_string(),
            customer_id: CustomerId::new(),
            created_by: "clerk".to_string(),
            lines: vec![LineRequest {
                item_id: ItemId::new(),
                quantity: dec!(2),
                price: dec!(15),
            }],
            payment_amount: dec!(0),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().check().is_ok());
    }

    #[test]
    fn test_missing_creator_rejected() {
        let mut req = request();
        req.created_by.clear();
        let err = req.check().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: creator is required");
    }

    #[test]
    fn test_empty_lines_rejected() {
        let mut req = request();
        req.lines.clear();
        assert!(matches!(req.check(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_negative_payment_rejected() {
        let mut req = request();
        req.payment_amount = dec!(-1);
        assert!(req.check().unwrap_err().to_string().contains("payment"));
    }

    #[test]
    fn test_line_amounts_left_to_item_resolution() {
        let mut req = request();
        req.lines[0].quantity = dec!(0);
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_payment_defaults_to_zero_when_absent() {
        let json = serde_json::json!({
            "direction": "in",
            "customer_id": uuid::Uuid::nil(),
            "created_by": "clerk",
            "lines": [],
        });
        let req: CreateTransactionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.payment_amount, Decimal::ZERO);
    }
}
