//! Customer debt aggregation
//!
//! A customer's `debt` field is the sum of outstanding debt across that
//! customer's active transactions. [`CustomerDebtAggregator`] is the only
//! writer of the field: ledger operations apply relative deltas inside their
//! own unit of work, and [`CustomerDebtAggregator::reconcile`] recomputes the
//! value from the transactions when it has drifted.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{CustomerId, Money};

use crate::error::LedgerError;
use crate::ports::{LedgerStore, LedgerUnit};
use crate::unit::finish;

/// Result of recomputing a customer's debt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtReconciliation {
    pub customer_id: CustomerId,
    pub previous: Money,
    pub reconciled: Money,
}

impl DebtReconciliation {
    /// Whether the stored value had drifted
    pub fn corrected(&self) -> bool {
        self.previous != self.reconciled
    }
}

/// Maintains customer debt balances
#[derive(Clone)]
pub struct CustomerDebtAggregator {
    store: Arc<dyn LedgerStore>,
}

impl CustomerDebtAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Adds `delta` to the customer's debt within an open unit and returns the new balance
    pub async fn apply(
        &self,
        unit: &mut dyn LedgerUnit,
        customer_id: CustomerId,
        delta: Money,
    ) -> Result<Money, LedgerError> {
        let balance = unit
            .add_customer_debt(customer_id, delta)
            .await
            .map_err(|e| LedgerError::from(e).with_entity("Customer"))?;
        debug!(customer_id = %customer_id, delta = %delta, balance = %balance, "Applied customer debt delta");
        Ok(balance)
    }

    /// Recomputes the customer's debt from their active transactions
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn reconcile(&self, customer_id: CustomerId) -> Result<DebtReconciliation, LedgerError> {
        let mut unit = self.store.begin().await?;
        let outcome = Self::recompute(unit.as_mut(), customer_id).await;
        let reconciliation = finish(unit, outcome).await?;

        if reconciliation.corrected() {
            warn!(
                previous = %reconciliation.previous,
                reconciled = %reconciliation.reconciled,
                "Customer debt drifted and was corrected"
            );
        } else {
            info!(debt = %reconciliation.reconciled, "Customer debt already consistent");
        }

        Ok(reconciliation)
    }

    async fn recompute(
        unit: &mut dyn LedgerUnit,
        customer_id: CustomerId,
    ) -> Result<DebtReconciliation, LedgerError> {
        let reconciled = unit.outstanding_debt(customer_id).await?;
        let previous = unit.set_customer_debt(customer_id, reconciled).await?;
        Ok(DebtReconciliation {
            customer_id,
            previous,
            reconciled,
        })
    }
}

impl std::fmt::Debug for CustomerDebtAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerDebtAggregator").finish_non_exhaustive()
    }
}
