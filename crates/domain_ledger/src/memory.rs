//! In-memory ledger store
//!
//! Backs the ledger with plain collections behind a single async mutex. A
//! unit of work holds the mutex for its whole lifetime and writes to a
//! private copy of the state, which replaces the shared state on commit.
//! Units are therefore fully serialized, which trivially satisfies the
//! concurrency contract of [`LedgerUnit`].
//!
//! Failures can be injected at named points to exercise rollback paths.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{
    AdapterHealth, CompanyId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, ItemId,
    Money, PortError, TransactionId,
};

use crate::expenditure::ExpenditureEntry;
use crate::inventory::{InventoryItem, StockMovement};
use crate::party::{Company, Customer};
use crate::payment::CreditPayment;
use crate::ports::{LedgerReader, LedgerStore, LedgerUnit, StockDecrement};
use crate::transaction::{Direction, PaymentStatus, Transaction};

/// Point at which the next unit of work should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    InsertTransaction,
    CustomerDebt,
    UpdateTransaction,
    InsertCreditPayment,
    InsertExpenditure,
    Commit,
}

/// Everything the in-memory store holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub companies: HashMap<CompanyId, Company>,
    pub customers: HashMap<CustomerId, Customer>,
    pub items: HashMap<ItemId, InventoryItem>,
    /// In insertion order
    pub transactions: Vec<Transaction>,
    /// In insertion order
    pub credit_payments: Vec<CreditPayment>,
    /// In insertion order
    pub expenditures: Vec<ExpenditureEntry>,
}

impl LedgerState {
    /// Active transaction carrying `invoice_number`
    pub fn transaction_by_invoice(&self, invoice_number: &str) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|t| t.is_active && t.invoice_number == invoice_number)
    }

    /// Payments for an invoice in insertion order
    pub fn payments_for(&self, invoice_number: &str) -> Vec<&CreditPayment> {
        self.credit_payments
            .iter()
            .filter(|p| p.invoice_number == invoice_number)
            .collect()
    }

    pub fn expenditures_for(&self, invoice_number: &str) -> Vec<&ExpenditureEntry> {
        self.expenditures
            .iter()
            .filter(|e| e.reference == invoice_number)
            .collect()
    }

    /// Sum of outstanding debt over a customer's active transactions
    pub fn outstanding_debt(&self, customer_id: CustomerId) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.is_active && t.customer_id == customer_id)
            .map(|t| t.debt)
            .sum()
    }

    fn stock_movement(&self, item_id: ItemId, since: NaiveDate) -> StockMovement {
        let mut movement = StockMovement {
            item_id,
            since,
            stock_in: Decimal::ZERO,
            stock_out: Decimal::ZERO,
        };

        for transaction in self.transactions.iter().filter(|t| t.is_active && t.date >= since) {
            let moved: Decimal = transaction
                .line_items
                .iter()
                .filter(|l| l.item_id == item_id)
                .map(|l| l.quantity)
                .sum();
            match transaction.direction {
                Direction::Inbound => movement.stock_in += moved,
                Direction::Outbound => movement.stock_out += moved,
            }
        }

        movement
    }

    fn active_transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.is_active && t.id == id)
    }

    fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction, PortError> {
        self.transactions
            .iter_mut()
            .find(|t| t.is_active && t.id == id)
            .ok_or_else(|| PortError::not_found("Transaction", id))
    }
}

/// Ledger store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    failure: Arc<Mutex<Option<FailurePoint>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_company(&self, company: Company) {
        self.state.lock().await.companies.insert(company.id, company);
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.state.lock().await.customers.insert(customer.id, customer);
    }

    pub async fn add_item(&self, item: InventoryItem) {
        self.state.lock().await.items.insert(item.id, item);
    }

    /// Marks an inventory item inactive; returns false if it does not exist
    pub async fn deactivate_item(&self, id: ItemId) -> bool {
        match self.state.lock().await.items.get_mut(&id) {
            Some(item) => {
                item.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Marks a transaction inactive without touching customer debt; returns
    /// false if it does not exist
    pub async fn deactivate_transaction(&self, id: TransactionId) -> bool {
        match self.state.lock().await.transactions.iter_mut().find(|t| t.id == id) {
            Some(transaction) => {
                transaction.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Overwrites a customer's stored debt, bypassing the ledger
    pub async fn corrupt_customer_debt(&self, id: CustomerId, debt: Money) -> bool {
        match self.state.lock().await.customers.get_mut(&id) {
            Some(customer) => {
                customer.debt = debt;
                true
            }
            None => false,
        }
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> LedgerState {
        self.state.lock().await.clone()
    }

    /// Arms a one-shot failure for the next unit that reaches `point`
    pub async fn fail_at(&self, point: FailurePoint) {
        *self.failure.lock().await = Some(point);
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-ledger-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedgerStore {
    async fn customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        self.state
            .lock()
            .await
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Customer", id))
    }

    async fn company(&self, id: CompanyId) -> Result<Company, PortError> {
        self.state
            .lock()
            .await
            .companies
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Company", id))
    }

    async fn company_of_customer(&self, customer_id: CustomerId) -> Result<Company, PortError> {
        let state = self.state.lock().await;
        let customer = state
            .customers
            .get(&customer_id)
            .ok_or_else(|| PortError::not_found("Customer", customer_id))?;
        state
            .companies
            .get(&customer.company_id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Company", customer.company_id))
    }

    async fn inventory_item(&self, id: ItemId) -> Result<InventoryItem, PortError> {
        self.state
            .lock()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Inventory item", id))
    }

    async fn transaction(&self, id: TransactionId) -> Result<Transaction, PortError> {
        self.state
            .lock()
            .await
            .active_transaction(id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Transaction", id))
    }

    async fn transaction_by_invoice(&self, invoice_number: &str) -> Result<Transaction, PortError> {
        self.state
            .lock()
            .await
            .transaction_by_invoice(invoice_number)
            .cloned()
            .ok_or_else(|| PortError::not_found("Transaction", invoice_number))
    }

    async fn list_transactions(&self, offset: u64, limit: u32) -> Result<Vec<Transaction>, PortError> {
        let state = self.state.lock().await;
        let mut active: Vec<&Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.is_active)
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(active
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_transactions(&self) -> Result<u64, PortError> {
        let state = self.state.lock().await;
        Ok(state.transactions.iter().filter(|t| t.is_active).count() as u64)
    }

    async fn credit_payments(&self, invoice_number: &str) -> Result<Vec<CreditPayment>, PortError> {
        let state = self.state.lock().await;
        let mut payments: Vec<CreditPayment> = state
            .credit_payments
            .iter()
            .rev()
            .filter(|p| p.invoice_number == invoice_number)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn stock_movement(&self, item_id: ItemId, since: NaiveDate) -> Result<StockMovement, PortError> {
        Ok(self.state.lock().await.stock_movement(item_id, since))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, PortError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryLedgerUnit {
            guard,
            working,
            failure: self.failure.clone(),
        }))
    }
}

/// Unit of work over [`InMemoryLedgerStore`]
pub struct InMemoryLedgerUnit {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    failure: Arc<Mutex<Option<FailurePoint>>>,
}

impl InMemoryLedgerUnit {
    async fn trip(&self, point: FailurePoint) -> Result<(), PortError> {
        let mut armed = self.failure.lock().await;
        if *armed == Some(point) {
            *armed = None;
            return Err(PortError::connection(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut InventoryItem, PortError> {
        self.working
            .items
            .get_mut(&id)
            .filter(|item| item.is_active)
            .ok_or_else(|| PortError::not_found("Inventory item", id))
    }

    fn customer_mut(&mut self, id: CustomerId) -> Result<&mut Customer, PortError> {
        self.working
            .customers
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Customer", id))
    }
}

#[async_trait]
impl LedgerUnit for InMemoryLedgerUnit {
    async fn item(&mut self, id: ItemId) -> Result<InventoryItem, PortError> {
        self.item_mut(id).map(|item| item.clone())
    }

    async fn increase_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<Decimal, PortError> {
        let item = self.item_mut(id)?;
        item.stock = item
            .stock
            .checked_add(quantity)
            .ok_or_else(|| PortError::validation("stock overflow"))?;
        item.updated_at = Utc::now();
        Ok(item.stock)
    }

    async fn decrease_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<StockDecrement, PortError> {
        let item = self.item_mut(id)?;
        if item.stock > quantity {
            item.stock -= quantity;
            item.updated_at = Utc::now();
            Ok(StockDecrement::Applied { remaining: item.stock })
        } else {
            Ok(StockDecrement::Rejected)
        }
    }

    async fn count_created_on(&mut self, date: NaiveDate) -> Result<u32, PortError> {
        let count = self.working.transactions.iter().filter(|t| t.date == date).count();
        u32::try_from(count).map_err(|_| PortError::internal("daily transaction count overflow"))
    }

    async fn add_customer_debt(&mut self, id: CustomerId, delta: Money) -> Result<Money, PortError> {
        self.trip(FailurePoint::CustomerDebt).await?;
        let customer = self.customer_mut(id)?;
        customer.debt = customer
            .debt
            .checked_add(&delta)
            .map_err(|e| PortError::validation(e.to_string()))?;
        Ok(customer.debt)
    }

    async fn set_customer_debt(&mut self, id: CustomerId, debt: Money) -> Result<Money, PortError> {
        self.trip(FailurePoint::CustomerDebt).await?;
        let customer = self.customer_mut(id)?;
        Ok(std::mem::replace(&mut customer.debt, debt))
    }

    async fn outstanding_debt(&mut self, id: CustomerId) -> Result<Money, PortError> {
        self.customer_mut(id)?;
        Ok(self.working.outstanding_debt(id))
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        self.trip(FailurePoint::InsertTransaction).await?;
        if self
            .working
            .transactions
            .iter()
            .any(|t| t.invoice_number == transaction.invoice_number)
        {
            return Err(PortError::conflict(format!(
                "invoice number {} already exists",
                transaction.invoice_number
            )));
        }
        self.working.transactions.push(transaction.clone());
        Ok(())
    }

    async fn transaction_by_invoice(&mut self, invoice_number: &str) -> Result<Transaction, PortError> {
        self.working
            .transaction_by_invoice(invoice_number)
            .cloned()
            .ok_or_else(|| PortError::not_found("Transaction", invoice_number))
    }

    async fn transaction(&mut self, id: TransactionId) -> Result<Transaction, PortError> {
        self.working
            .active_transaction(id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Transaction", id))
    }

    async fn deactivate_transaction(&mut self, id: TransactionId, updated_by: &str) -> Result<(), PortError> {
        self.trip(FailurePoint::UpdateTransaction).await?;
        let transaction = self.working.transaction_mut(id)?;
        transaction.is_active = false;
        transaction.updated_by = updated_by.to_string();
        transaction.updated_at = Utc::now();
        Ok(())
    }

    async fn update_payment_status(
        &mut self,
        id: TransactionId,
        status: PaymentStatus,
        updated_by: &str,
    ) -> Result<(), PortError> {
        self.trip(FailurePoint::UpdateTransaction).await?;
        let transaction = self.working.transaction_mut(id)?;
        transaction.payment_status = status;
        transaction.updated_by = updated_by.to_string();
        transaction.updated_at = Utc::now();
        Ok(())
    }

    async fn update_payment_amount(
        &mut self,
        id: TransactionId,
        payment_amount: Money,
        updated_by: &str,
    ) -> Result<(), PortError> {
        self.trip(FailurePoint::UpdateTransaction).await?;
        let transaction = self.working.transaction_mut(id)?;
        transaction.payment_amount = payment_amount;
        transaction.updated_by = updated_by.to_string();
        transaction.updated_at = Utc::now();
        Ok(())
    }

    async fn update_debt(&mut self, id: TransactionId, debt: Money) -> Result<(), PortError> {
        self.trip(FailurePoint::UpdateTransaction).await?;
        let transaction = self.working.transaction_mut(id)?;
        transaction.debt = debt;
        transaction.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_credit_payment(&mut self, payment: &CreditPayment) -> Result<(), PortError> {
        self.trip(FailurePoint::InsertCreditPayment).await?;
        self.working.credit_payments.push(payment.clone());
        Ok(())
    }

    async fn count_credit_payments(&mut self, invoice_number: &str) -> Result<u32, PortError> {
        let count = self.working.payments_for(invoice_number).len();
        u32::try_from(count).map_err(|_| PortError::internal("credit payment count overflow"))
    }

    async fn sum_credit_payments(&mut self, invoice_number: &str) -> Result<Money, PortError> {
        Ok(self
            .working
            .payments_for(invoice_number)
            .into_iter()
            .map(|p| p.amount)
            .sum())
    }

    async fn insert_expenditure(&mut self, entry: &ExpenditureEntry) -> Result<(), PortError> {
        self.trip(FailurePoint::InsertExpenditure).await?;
        self.working.expenditures.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.trip(FailurePoint::Commit).await?;
        let InMemoryLedgerUnit {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        Ok(())
    }
}
