//! Inventory items and stock movement

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ItemId, Money};

/// A stocked item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    /// List price; transactions carry their own per-line price
    pub price: Money,
    pub stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Creates an active item
    pub fn new(name: impl Into<String>, price: Money, stock: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::new_v7(),
            name: name.into(),
            price,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether an outbound line of `quantity` leaves stock strictly positive
    pub fn can_release(&self, quantity: Decimal) -> bool {
        quantity < self.stock
    }
}

/// Quantity moved in and out of one item since a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub item_id: ItemId,
    pub since: NaiveDate,
    pub stock_in: Decimal,
    pub stock_out: Decimal,
}

impl StockMovement {
    pub fn net(&self) -> Decimal {
        self.stock_in - self.stock_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_release_requires_remaining_stock() {
        let item = InventoryItem::new("Brisket", Money::new(dec!(10)), dec!(5), Utc::now());
        assert!(item.can_release(dec!(4)));
        assert!(!item.can_release(dec!(5)));
        assert!(!item.can_release(dec!(6)));
    }

    #[test]
    fn test_net_movement() {
        let movement = StockMovement {
            item_id: ItemId::new(),
            since: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            stock_in: dec!(12),
            stock_out: dec!(4.5),
        };
        assert_eq!(movement.net(), dec!(7.5));
    }
}
