//! Ledger Engine
//!
//! Creates inbound and outbound transactions. A single call:
//!
//! 1. validates the request and resolves the customer and their company
//! 2. assigns the next invoice number for the business date
//! 3. resolves every line against inventory and, for outbound movements,
//!    checks that stock stays strictly positive
//! 4. computes line totals, the transaction total, payment status and debt
//! 5. adjusts stock, persists the transaction, updates the customer's debt,
//!    writes the expenditure entry for inbound purchases and records the
//!    opening credit payment
//!
//! Steps 2 to 5 run in one unit of work. Nothing is written unless every
//! step succeeds.
//!
//! Voiding marks a transaction inactive and releases its outstanding debt
//! from the customer's balance. Stock and payment records are left as they
//! are.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{Clock, CustomerId, ItemId, Money, TransactionId};

use crate::debt::CustomerDebtAggregator;
use crate::error::LedgerError;
use crate::expenditure::ExpenditureEntry;
use crate::invoice::InvoiceNumber;
use crate::party::{Company, Customer};
use crate::payment::CreditPayment;
use crate::ports::{LedgerStore, LedgerUnit, StockDecrement};
use crate::request::CreateTransactionRequest;
use crate::transaction::{CustomerSnapshot, Direction, LineItem, OpeningBalance, Transaction};
use crate::unit::finish;

/// Creates ledger transactions
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    debts: CustomerDebtAggregator,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        let debts = CustomerDebtAggregator::new(store.clone());
        Self { store, clock, debts }
    }

    /// Records a new inbound or outbound transaction
    ///
    /// # Errors
    ///
    /// - `Validation` for an unknown direction, a missing creator, no lines,
    ///   a non-positive quantity or price, or a negative payment
    /// - `NotFound` for an unknown customer, company or inventory item
    /// - `InsufficientStock` when an outbound line would not leave stock
    ///   strictly positive
    /// - `AmountExceedsTotal` when the opening payment exceeds the total
    /// - `Internal` when the store fails
    #[instrument(
        skip(self, request),
        fields(customer_id = %request.customer_id, direction = %request.direction, lines = request.lines.len())
    )]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        let direction: Direction = request.direction.parse()?;
        request.check()?;

        let (customer, company) = self.resolve_counterparty(request.customer_id).await?;

        let mut unit = self.store.begin().await?;
        let outcome = self
            .record(unit.as_mut(), direction, &request, &customer, &company)
            .await;
        let transaction = finish(unit, outcome).await.map_err(|e| {
            warn!(error = %e, "Transaction creation failed");
            e
        })?;

        info!(
            invoice_number = %transaction.invoice_number,
            total = %transaction.total,
            debt = %transaction.debt,
            status = %transaction.payment_status,
            "Transaction created"
        );

        Ok(transaction)
    }

    /// Voids an active transaction
    ///
    /// Returns the transaction as it stood once voided.
    ///
    /// # Errors
    ///
    /// - `Validation` when `voided_by` is blank
    /// - `NotFound` when no active transaction has `id`
    /// - `Internal` when the store fails
    #[instrument(skip(self), fields(transaction_id = %id))]
    pub async fn void_transaction(
        &self,
        id: TransactionId,
        voided_by: &str,
    ) -> Result<Transaction, LedgerError> {
        if voided_by.trim().is_empty() {
            return Err(LedgerError::validation("voided_by is required"));
        }

        let mut unit = self.store.begin().await?;
        let outcome = self.void(unit.as_mut(), id, voided_by).await;
        let transaction = finish(unit, outcome).await.map_err(|e| {
            warn!(error = %e, "Transaction void failed");
            e
        })?;

        info!(
            invoice_number = %transaction.invoice_number,
            released_debt = %transaction.debt,
            "Transaction voided"
        );

        Ok(transaction)
    }

    async fn void(
        &self,
        unit: &mut dyn LedgerUnit,
        id: TransactionId,
        voided_by: &str,
    ) -> Result<Transaction, LedgerError> {
        let mut transaction = unit.transaction(id).await?;
        let outstanding = transaction.remaining()?;

        unit.deactivate_transaction(id, voided_by).await?;
        if !outstanding.is_zero() {
            self.debts.apply(unit, transaction.customer_id, -outstanding).await?;
        }

        transaction.is_active = false;
        transaction.updated_by = voided_by.to_string();
        transaction.updated_at = self.clock.now();
        Ok(transaction)
    }

    async fn resolve_counterparty(
        &self,
        customer_id: CustomerId,
    ) -> Result<(Customer, Company), LedgerError> {
        let (customer, company) = tokio::try_join!(
            self.store.customer(customer_id),
            self.store.company_of_customer(customer_id),
        )?;
        if company.id != customer.company_id {
            return Err(LedgerError::conflict(format!(
                "customer {} changed company during lookup",
                customer_id
            )));
        }
        Ok((customer, company))
    }

    async fn record(
        &self,
        unit: &mut dyn LedgerUnit,
        direction: Direction,
        request: &CreateTransactionRequest,
        customer: &Customer,
        company: &Company,
    ) -> Result<Transaction, LedgerError> {
        let now = self.clock.now();
        let today = self.clock.today();

        let sequence = unit.count_created_on(today).await?;
        let invoice_number = InvoiceNumber::new(direction, today, sequence).to_string();
        debug!(invoice_number = %invoice_number, "Assigned invoice number");

        let transaction_id = TransactionId::new_v7();
        let line_items = self
            .resolve_lines(unit, direction, transaction_id, request, now)
            .await?;

        let total = Money::checked_sum(line_items.iter().map(|l| &l.total))?;
        let payment = Money::new(request.payment_amount);
        let balance = OpeningBalance::assess(total, payment)?;

        for line in &line_items {
            match direction {
                Direction::Inbound => {
                    unit.increase_stock(line.item_id, line.quantity).await?;
                }
                Direction::Outbound => {
                    Self::release_stock(unit, line.item_id, &line.item_name, line.quantity).await?;
                }
            }
        }

        let transaction = Transaction {
            id: transaction_id,
            date: today,
            invoice_number,
            direction,
            customer_id: customer.id,
            customer: CustomerSnapshot {
                name: customer.full_name.clone(),
                address: customer.address.clone(),
                phone_number: customer.phone_number.clone(),
                company_name: company.company_name.clone(),
            },
            line_items,
            total,
            payment_amount: payment,
            debt: balance.debt,
            payment_status: balance.status,
            is_active: true,
            created_by: request.created_by.clone(),
            updated_by: request.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        unit.insert_transaction(&transaction).await?;
        self.debts.apply(unit, customer.id, transaction.debt).await?;

        if direction == Direction::Inbound {
            unit.insert_expenditure(&ExpenditureEntry::stock_in(&transaction, now)).await?;
        }

        unit.insert_credit_payment(&CreditPayment::opening(&transaction, now)).await?;

        Ok(transaction)
    }

    /// Resolves each requested line against inventory.
    ///
    /// Per line: the item must exist and be active, then quantity and price
    /// must be positive, then outbound stock must cover the quantity. Outbound
    /// lines are checked against a running projection so that two lines for
    /// the same item are judged against the stock left by the first.
    async fn resolve_lines(
        &self,
        unit: &mut dyn LedgerUnit,
        direction: Direction,
        transaction_id: TransactionId,
        request: &CreateTransactionRequest,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<LineItem>, LedgerError> {
        let mut projected: HashMap<ItemId, Decimal> = HashMap::new();
        let mut line_items = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let item = unit
                .item(line.item_id)
                .await
                .map_err(|e| LedgerError::from(e).with_entity("Inventory item"))?;

            let line_item = LineItem::new(
                transaction_id,
                &item,
                line.quantity,
                Money::new(line.price),
                &request.created_by,
                now,
            )?;

            if direction == Direction::Outbound {
                let available = *projected.entry(item.id).or_insert(item.stock);
                if line.quantity >= available {
                    warn!(
                        item = %item.name,
                        requested = %line.quantity,
                        available = %available,
                        "Insufficient stock"
                    );
                    return Err(LedgerError::InsufficientStock {
                        item: item.name,
                        requested: line.quantity,
                        available,
                    });
                }
                projected.insert(item.id, available - line.quantity);
            }

            line_items.push(line_item);
        }

        Ok(line_items)
    }

    async fn release_stock(
        unit: &mut dyn LedgerUnit,
        item_id: ItemId,
        item_name: &str,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        match unit.decrease_stock(item_id, quantity).await? {
            StockDecrement::Applied { remaining } => {
                debug!(item = %item_name, remaining = %remaining, "Stock released");
                Ok(())
            }
            StockDecrement::Rejected => {
                let available = unit.item(item_id).await?.stock;
                warn!(item = %item_name, requested = %quantity, available = %available, "Stock decrement rejected");
                Err(LedgerError::InsufficientStock {
                    item: item_name.to_string(),
                    requested: quantity,
                    available,
                })
            }
        }
    }
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
