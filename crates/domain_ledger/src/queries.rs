//! Read-side queries over the ledger

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;

use core_kernel::{CustomerId, ItemId, TransactionId};

use crate::error::LedgerError;
use crate::inventory::StockMovement;
use crate::party::Customer;
use crate::payment::CreditPayment;
use crate::ports::{LedgerStore, Page};
use crate::transaction::Transaction;

/// Read-only access to transactions, payments and stock movement
#[derive(Clone)]
pub struct LedgerQueries {
    store: Arc<dyn LedgerStore>,
}

impl LedgerQueries {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn transaction_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        Ok(self.store.transaction(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn transaction_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Transaction, LedgerError> {
        self.store
            .transaction_by_invoice(invoice_number)
            .await
            .map_err(|e| LedgerError::from(e).with_entity("Invoice"))
    }

    /// Active transactions, newest first
    ///
    /// `page` is 1-based. A page below 1 is read as 1 and a page past the end
    /// is clamped to the last page. `page_size` must be at least 1.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        page: i64,
        page_size: u32,
    ) -> Result<Page<Transaction>, LedgerError> {
        if page_size == 0 {
            return Err(LedgerError::validation("page size must be greater than zero"));
        }

        let total_items = self.store.count_transactions().await?;
        let total_pages = u32::try_from(total_items.div_ceil(u64::from(page_size)))
            .map_err(|_| LedgerError::internal("page count overflow"))?;

        let page = clamp_page(page, total_pages);
        let offset = u64::from(page - 1) * u64::from(page_size);
        let items = if total_items == 0 {
            Vec::new()
        } else {
            self.store.list_transactions(offset, page_size).await?
        };

        Ok(Page {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        })
    }

    /// Payment history of an invoice, newest first
    #[instrument(skip(self))]
    pub async fn credit_payments(&self, invoice_number: &str) -> Result<Vec<CreditPayment>, LedgerError> {
        self.transaction_by_invoice_number(invoice_number).await?;
        Ok(self.store.credit_payments(invoice_number).await?)
    }

    /// Stock moved in and out of an item since `since`
    #[instrument(skip(self))]
    pub async fn stock_movement(
        &self,
        item_id: ItemId,
        since: NaiveDate,
    ) -> Result<StockMovement, LedgerError> {
        self.store.inventory_item(item_id).await?;
        Ok(self.store.stock_movement(item_id, since).await?)
    }

    #[instrument(skip(self))]
    pub async fn customer(&self, id: CustomerId) -> Result<Customer, LedgerError> {
        Ok(self.store.customer(id).await?)
    }
}

impl std::fmt::Debug for LedgerQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerQueries").finish_non_exhaustive()
    }
}

fn clamp_page(requested: i64, total_pages: u32) -> u32 {
    let last = total_pages.max(1);
    if requested < 1 {
        1
    } else {
        u32::try_from(requested).map_or(last, |p| p.min(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(-3, 5), 1);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(9, 5), 5);
        assert_eq!(clamp_page(i64::MAX, 5), 5);
        assert_eq!(clamp_page(4, 0), 1);
    }
}
