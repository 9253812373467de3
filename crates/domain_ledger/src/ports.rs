//! Ledger Domain Ports
//!
//! This module defines the storage boundary of the ledger. Two adapters
//! implement it:
//!
//! - **PostgreSQL Adapter** (`infra_db::PostgresLedgerStore`)
//! - **In-Memory Adapter** (`crate::memory::InMemoryLedgerStore`) for tests
//!   and embedding
//!
//! # Units of work
//!
//! Every mutating operation obtains a [`LedgerUnit`] from
//! [`LedgerStore::begin`] and performs all of its writes through it. A unit
//! is committed with [`LedgerUnit::commit`]; dropping it or calling
//! [`LedgerUnit::rollback`] discards every write. Adapters must make the
//! following safe under concurrency:
//!
//! - [`LedgerUnit::count_created_on`] serializes invoice sequencing per day
//!   until the unit ends, so two units never observe the same count
//! - [`LedgerUnit::decrease_stock`] only applies when the remaining stock
//!   stays strictly positive
//! - [`LedgerUnit::add_customer_debt`] is a relative update, never a
//!   read-modify-write
//! - [`LedgerUnit::transaction`] and [`LedgerUnit::transaction_by_invoice`]
//!   lock the transaction until the unit ends
//! - [`LedgerUnit::outstanding_debt`] locks the customer before summing, so
//!   no debt delta can commit between the sum and a following
//!   [`LedgerUnit::set_customer_debt`]
//!
//! Inactive (voided) transactions are invisible to every lookup.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut unit = store.begin().await?;
//! let sequence = unit.count_created_on(today).await?;
//! unit.insert_transaction(&transaction).await?;
//! unit.commit().await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    CompanyId, CustomerId, DomainPort, HealthCheckable, ItemId, Money, PortError, TransactionId,
};

use crate::expenditure::ExpenditureEntry;
use crate::inventory::{InventoryItem, StockMovement};
use crate::party::{Company, Customer};
use crate::payment::CreditPayment;
use crate::transaction::{PaymentStatus, Transaction};

/// Outcome of a guarded stock decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was reduced; carries the remaining quantity
    Applied { remaining: Decimal },
    /// Current stock was not strictly greater than the quantity
    Rejected,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Read access shared by every caller
#[async_trait]
pub trait LedgerReader: DomainPort {
    /// Retrieves a customer by ID
    async fn customer(&self, id: CustomerId) -> Result<Customer, PortError>;

    /// Retrieves a company by ID
    async fn company(&self, id: CompanyId) -> Result<Company, PortError>;

    /// Retrieves the company a customer belongs to
    ///
    /// Keyed by customer so it can run concurrently with [`Self::customer`].
    async fn company_of_customer(&self, customer_id: CustomerId) -> Result<Company, PortError>;

    /// Retrieves an inventory item by ID, active or not
    async fn inventory_item(&self, id: ItemId) -> Result<InventoryItem, PortError>;

    /// Retrieves an active transaction with its line items
    async fn transaction(&self, id: TransactionId) -> Result<Transaction, PortError>;

    /// Retrieves an active transaction by invoice number
    async fn transaction_by_invoice(&self, invoice_number: &str) -> Result<Transaction, PortError>;

    /// Active transactions, newest first
    async fn list_transactions(&self, offset: u64, limit: u32) -> Result<Vec<Transaction>, PortError>;

    /// Number of active transactions
    async fn count_transactions(&self) -> Result<u64, PortError>;

    /// Credit payments for an invoice, newest first
    async fn credit_payments(&self, invoice_number: &str) -> Result<Vec<CreditPayment>, PortError>;

    /// Quantity moved through an item on active transactions dated on or after `since`
    async fn stock_movement(&self, item_id: ItemId, since: NaiveDate) -> Result<StockMovement, PortError>;
}

/// A store that can open units of work
#[async_trait]
pub trait LedgerStore: LedgerReader + HealthCheckable {
    /// Opens a new unit of work
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, PortError>;
}

/// An open unit of work
///
/// Every write is provisional until [`LedgerUnit::commit`].
#[async_trait]
pub trait LedgerUnit: Send {
    // ========================================================================
    // Inventory
    // ========================================================================

    /// Retrieves an active inventory item, locking it for the rest of the unit
    async fn item(&mut self, id: ItemId) -> Result<InventoryItem, PortError>;

    /// Adds to an item's stock and returns the new level
    async fn increase_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<Decimal, PortError>;

    /// Subtracts from an item's stock only if stock stays strictly positive
    async fn decrease_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<StockDecrement, PortError>;

    // ========================================================================
    // Invoice sequencing
    // ========================================================================

    /// Number of transactions created on `date`
    ///
    /// Holds the per-day sequencing lock until the unit ends.
    async fn count_created_on(&mut self, date: NaiveDate) -> Result<u32, PortError>;

    // ========================================================================
    // Customer debt
    // ========================================================================

    /// Adds `delta` to a customer's debt and returns the new value
    async fn add_customer_debt(&mut self, id: CustomerId, delta: Money) -> Result<Money, PortError>;

    /// Replaces a customer's debt and returns the previous value
    async fn set_customer_debt(&mut self, id: CustomerId, debt: Money) -> Result<Money, PortError>;

    /// Sum of outstanding debt over a customer's active transactions
    ///
    /// Locks the customer for the rest of the unit before summing.
    async fn outstanding_debt(&mut self, id: CustomerId) -> Result<Money, PortError>;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Inserts a transaction header with all of its line items
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError>;

    /// Retrieves an active transaction, locking it for the rest of the unit
    async fn transaction(&mut self, id: TransactionId) -> Result<Transaction, PortError>;

    /// Retrieves an active transaction by invoice number, locking it for the rest of the unit
    async fn transaction_by_invoice(&mut self, invoice_number: &str) -> Result<Transaction, PortError>;

    /// Marks an active transaction inactive
    async fn deactivate_transaction(&mut self, id: TransactionId, updated_by: &str) -> Result<(), PortError>;

    async fn update_payment_status(
        &mut self,
        id: TransactionId,
        status: PaymentStatus,
        updated_by: &str,
    ) -> Result<(), PortError>;

    async fn update_payment_amount(
        &mut self,
        id: TransactionId,
        payment_amount: Money,
        updated_by: &str,
    ) -> Result<(), PortError>;

    async fn update_debt(&mut self, id: TransactionId, debt: Money) -> Result<(), PortError>;

    // ========================================================================
    // Credit payments and expenditures
    // ========================================================================

    async fn insert_credit_payment(&mut self, payment: &CreditPayment) -> Result<(), PortError>;

    async fn count_credit_payments(&mut self, invoice_number: &str) -> Result<u32, PortError>;

    async fn sum_credit_payments(&mut self, invoice_number: &str) -> Result<Money, PortError>;

    async fn insert_expenditure(&mut self, entry: &ExpenditureEntry) -> Result<(), PortError>;

    // ========================================================================
    // Completion
    // ========================================================================

    /// Makes every write of this unit durable
    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    /// Discards every write of this unit
    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}
