//! PostgreSQL Ledger Adapter
//!
//! [`PostgresLedgerStore`] serves reads from pooled connections. Each
//! [`PgLedgerUnit`] owns one database transaction, so every write made
//! through it commits or rolls back together.
//!
//! Concurrency guarantees of the unit map onto PostgreSQL as follows:
//!
//! - invoice sequencing takes a transaction-scoped advisory lock keyed by day
//! - stock decrements are a single guarded `UPDATE ... WHERE stock > qty`
//! - customer debt changes are relative `debt = debt + delta` updates
//! - transactions fetched for settlement are locked `FOR UPDATE`

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, CompanyId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, ItemId,
    Money, PortError, TransactionId,
};
use domain_ledger::{
    Company, CreditPayment, Customer, CustomerSnapshot, Direction, ExpenditureEntry, InventoryItem,
    LedgerReader, LedgerStore, LedgerUnit, LineItem, PaymentStatus, StockDecrement, StockMovement,
    Transaction,
};

use crate::error::DatabaseError;
use crate::repositories::{
    inventory, party, payment, transaction, CompanyRow, CreditPaymentRow, CustomerRow,
    DbPaymentStatus, ExpenditureRow, InventoryItemRow, TransactionDetailRow, TransactionHeaderRow,
    TxDirection,
};

const ADAPTER_ID: &str = "postgres-ledger-store";

/// PostgreSQL-backed implementation of the ledger ports
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn connection(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, PortError> {
        Ok(self.pool.acquire().await.map_err(DatabaseError::from)?)
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerReader for PostgresLedgerStore {
    #[instrument(skip(self), fields(customer_id = %id))]
    async fn customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        debug!("Fetching customer");
        let mut conn = self.connection().await?;
        Ok(row_to_customer(party::fetch_customer(&mut conn, id.into()).await?))
    }

    #[instrument(skip(self), fields(company_id = %id))]
    async fn company(&self, id: CompanyId) -> Result<Company, PortError> {
        let mut conn = self.connection().await?;
        Ok(row_to_company(party::fetch_company(&mut conn, id.into()).await?))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn company_of_customer(&self, customer_id: CustomerId) -> Result<Company, PortError> {
        let mut conn = self.connection().await?;
        Ok(row_to_company(
            party::fetch_company_of_customer(&mut conn, customer_id.into()).await?,
        ))
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn inventory_item(&self, id: ItemId) -> Result<InventoryItem, PortError> {
        let mut conn = self.connection().await?;
        Ok(row_to_item(inventory::fetch_item(&mut conn, id.into()).await?))
    }

    #[instrument(skip(self), fields(transaction_id = %id))]
    async fn transaction(&self, id: TransactionId) -> Result<Transaction, PortError> {
        debug!("Fetching transaction");
        let mut conn = self.connection().await?;
        let header = transaction::fetch_header(&mut conn, id.into(), false).await?;
        load_transaction(&mut conn, header).await
    }

    #[instrument(skip(self))]
    async fn transaction_by_invoice(&self, invoice_number: &str) -> Result<Transaction, PortError> {
        debug!("Fetching transaction by invoice");
        let mut conn = self.connection().await?;
        let header = transaction::fetch_header_by_invoice(&mut conn, invoice_number, false).await?;
        load_transaction(&mut conn, header).await
    }

    #[instrument(skip(self))]
    async fn list_transactions(&self, offset: u64, limit: u32) -> Result<Vec<Transaction>, PortError> {
        let offset = i64::try_from(offset)
            .map_err(|_| PortError::validation(format!("offset {} out of range", offset)))?;

        let mut conn = self.connection().await?;
        let headers = transaction::list_active_headers(&mut conn, offset, i64::from(limit)).await?;
        debug!(count = headers.len(), "Listed transaction headers");

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut details_by_tx: HashMap<Uuid, Vec<TransactionDetailRow>> = HashMap::new();
        for detail in transaction::fetch_details(&mut conn, &ids).await? {
            details_by_tx.entry(detail.transaction_id).or_default().push(detail);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let details = details_by_tx.remove(&header.id).unwrap_or_default();
                row_to_transaction(header, details)
            })
            .collect())
    }

    async fn count_transactions(&self) -> Result<u64, PortError> {
        let mut conn = self.connection().await?;
        let count = transaction::count_active(&mut conn).await?;
        u64::try_from(count).map_err(|_| PortError::internal(format!("negative count {}", count)))
    }

    #[instrument(skip(self))]
    async fn credit_payments(&self, invoice_number: &str) -> Result<Vec<CreditPayment>, PortError> {
        let mut conn = self.connection().await?;
        let rows = payment::list_for_invoice(&mut conn, invoice_number).await?;
        Ok(rows.into_iter().map(row_to_credit_payment).collect())
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn stock_movement(&self, item_id: ItemId, since: NaiveDate) -> Result<StockMovement, PortError> {
        let mut conn = self.connection().await?;
        let (stock_in, stock_out) = inventory::stock_movement(&mut conn, item_id.into(), since).await?;
        Ok(StockMovement {
            item_id,
            since,
            stock_in,
            stock_out,
        })
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, PortError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        debug!("Opened ledger unit");
        Ok(Box::new(PgLedgerUnit { tx }))
    }
}

/// A ledger unit backed by one PostgreSQL transaction
///
/// Dropping the unit without committing rolls the transaction back.
pub struct PgLedgerUnit {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgLedgerUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgLedgerUnit").finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn item(&mut self, id: ItemId) -> Result<InventoryItem, PortError> {
        Ok(row_to_item(inventory::lock_active_item(&mut self.tx, id.into()).await?))
    }

    async fn increase_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<Decimal, PortError> {
        Ok(inventory::increase_stock(&mut self.tx, id.into(), quantity).await?)
    }

    async fn decrease_stock(&mut self, id: ItemId, quantity: Decimal) -> Result<StockDecrement, PortError> {
        let remaining = inventory::decrease_stock_guarded(&mut self.tx, id.into(), quantity).await?;
        Ok(match remaining {
            Some(remaining) => StockDecrement::Applied { remaining },
            None => StockDecrement::Rejected,
        })
    }

    async fn count_created_on(&mut self, date: NaiveDate) -> Result<u32, PortError> {
        transaction::lock_daily_sequence(&mut self.tx, date).await?;
        let count = transaction::count_created_on(&mut self.tx, date).await?;
        u32::try_from(count).map_err(|_| PortError::internal(format!("daily count {} out of range", count)))
    }

    async fn add_customer_debt(&mut self, id: CustomerId, delta: Money) -> Result<Money, PortError> {
        let debt = party::add_customer_debt(&mut self.tx, id.into(), delta.amount()).await?;
        Ok(Money::new(debt))
    }

    async fn set_customer_debt(&mut self, id: CustomerId, debt: Money) -> Result<Money, PortError> {
        let previous = party::replace_customer_debt(&mut self.tx, id.into(), debt.amount()).await?;
        Ok(Money::new(previous))
    }

    async fn outstanding_debt(&mut self, id: CustomerId) -> Result<Money, PortError> {
        // Deltas from other units queue behind this lock until the unit ends
        party::lock_customer_debt(&mut self.tx, id.into()).await?;
        Ok(Money::new(transaction::outstanding_debt(&mut self.tx, id.into()).await?))
    }

    #[instrument(skip(self, tx), fields(invoice = %tx.invoice_number))]
    async fn insert_transaction(&mut self, tx: &Transaction) -> Result<(), PortError> {
        let (header, details) = transaction_to_rows(tx);
        transaction::insert_header(&mut self.tx, &header).await?;
        for detail in &details {
            transaction::insert_detail(&mut self.tx, detail).await?;
        }
        debug!(lines = details.len(), "Inserted transaction");
        Ok(())
    }

    async fn transaction(&mut self, id: TransactionId) -> Result<Transaction, PortError> {
        let header = transaction::fetch_header(&mut self.tx, id.into(), true).await?;
        load_transaction(&mut self.tx, header).await
    }

    async fn transaction_by_invoice(&mut self, invoice_number: &str) -> Result<Transaction, PortError> {
        let header = transaction::fetch_header_by_invoice(&mut self.tx, invoice_number, true).await?;
        load_transaction(&mut self.tx, header).await
    }

    #[instrument(skip(self))]
    async fn deactivate_transaction(&mut self, id: TransactionId, updated_by: &str) -> Result<(), PortError> {
        transaction::deactivate(&mut self.tx, id.into(), updated_by).await?;
        debug!(transaction_id = %id, "Deactivated transaction");
        Ok(())
    }

    async fn update_payment_status(
        &mut self,
        id: TransactionId,
        status: PaymentStatus,
        updated_by: &str,
    ) -> Result<(), PortError> {
        Ok(transaction::update_payment_status(&mut self.tx, id.into(), status_to_db(status), updated_by).await?)
    }

    async fn update_payment_amount(
        &mut self,
        id: TransactionId,
        payment_amount: Money,
        updated_by: &str,
    ) -> Result<(), PortError> {
        Ok(transaction::update_payment_amount(&mut self.tx, id.into(), payment_amount.amount(), updated_by).await?)
    }

    async fn update_debt(&mut self, id: TransactionId, debt: Money) -> Result<(), PortError> {
        Ok(transaction::update_debt(&mut self.tx, id.into(), debt.amount()).await?)
    }

    async fn insert_credit_payment(&mut self, credit: &CreditPayment) -> Result<(), PortError> {
        Ok(payment::insert_credit_payment(&mut self.tx, &credit_payment_to_row(credit)).await?)
    }

    async fn count_credit_payments(&mut self, invoice_number: &str) -> Result<u32, PortError> {
        let count = payment::count_for_invoice(&mut self.tx, invoice_number).await?;
        u32::try_from(count).map_err(|_| PortError::internal(format!("payment count {} out of range", count)))
    }

    async fn sum_credit_payments(&mut self, invoice_number: &str) -> Result<Money, PortError> {
        Ok(Money::new(payment::sum_for_invoice(&mut self.tx, invoice_number).await?))
    }

    async fn insert_expenditure(&mut self, entry: &ExpenditureEntry) -> Result<(), PortError> {
        Ok(payment::insert_expenditure(&mut self.tx, &expenditure_to_row(entry)).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        debug!("Committed ledger unit");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        debug!("Rolled back ledger unit");
        Ok(())
    }
}

async fn load_transaction(
    conn: &mut PgConnection,
    header: TransactionHeaderRow,
) -> Result<Transaction, PortError> {
    let details = transaction::fetch_details(conn, &[header.id]).await?;
    Ok(row_to_transaction(header, details))
}

// ============================================================================
// Row conversion
// ============================================================================

fn row_to_company(row: CompanyRow) -> Company {
    Company {
        id: row.id.into(),
        company_name: row.company_name,
        address: row.address,
        email: row.email,
        phone_number: row.phone_number,
        is_active: row.is_active,
    }
}

fn row_to_customer(row: CustomerRow) -> Customer {
    Customer {
        id: row.id.into(),
        company_id: row.company_id.into(),
        full_name: row.full_name,
        address: row.address,
        phone_number: row.phone_number,
        debt: Money::new(row.debt),
    }
}

fn row_to_item(row: InventoryItemRow) -> InventoryItem {
    InventoryItem {
        id: row.id.into(),
        name: row.name,
        price: Money::new(row.price),
        stock: row.stock,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn direction_from_db(direction: TxDirection) -> Direction {
    match direction {
        TxDirection::Inbound => Direction::Inbound,
        TxDirection::Outbound => Direction::Outbound,
    }
}

fn direction_to_db(direction: Direction) -> TxDirection {
    match direction {
        Direction::Inbound => TxDirection::Inbound,
        Direction::Outbound => TxDirection::Outbound,
    }
}

fn status_from_db(status: DbPaymentStatus) -> PaymentStatus {
    match status {
        DbPaymentStatus::Unpaid => PaymentStatus::Unpaid,
        DbPaymentStatus::Paid => PaymentStatus::Paid,
    }
}

fn status_to_db(status: PaymentStatus) -> DbPaymentStatus {
    match status {
        PaymentStatus::Unpaid => DbPaymentStatus::Unpaid,
        PaymentStatus::Paid => DbPaymentStatus::Paid,
    }
}

fn row_to_transaction(header: TransactionHeaderRow, details: Vec<TransactionDetailRow>) -> Transaction {
    let mut details = details;
    details.sort_by_key(|d| d.line_number);

    Transaction {
        id: header.id.into(),
        date: header.tx_date,
        invoice_number: header.invoice_number,
        direction: direction_from_db(header.direction),
        customer_id: header.customer_id.into(),
        customer: CustomerSnapshot {
            name: header.customer_name,
            address: header.customer_address,
            phone_number: header.customer_phone,
            company_name: header.company_name,
        },
        line_items: details
            .into_iter()
            .map(|d| LineItem {
                id: d.id.into(),
                transaction_id: d.transaction_id.into(),
                item_id: d.item_id.into(),
                item_name: d.item_name,
                quantity: d.quantity,
                price: Money::new(d.price),
                total: Money::new(d.total),
                created_at: d.created_at,
                created_by: d.created_by,
            })
            .collect(),
        total: Money::new(header.total),
        payment_amount: Money::new(header.payment_amount),
        debt: Money::new(header.debt),
        payment_status: status_from_db(header.payment_status),
        is_active: header.is_active,
        created_by: header.created_by,
        updated_by: header.updated_by,
        created_at: header.created_at,
        updated_at: header.updated_at,
    }
}

fn transaction_to_rows(tx: &Transaction) -> (TransactionHeaderRow, Vec<TransactionDetailRow>) {
    let header = TransactionHeaderRow {
        id: tx.id.into(),
        tx_date: tx.date,
        invoice_number: tx.invoice_number.clone(),
        direction: direction_to_db(tx.direction),
        customer_id: tx.customer_id.into(),
        customer_name: tx.customer.name.clone(),
        customer_address: tx.customer.address.clone(),
        customer_phone: tx.customer.phone_number.clone(),
        company_name: tx.customer.company_name.clone(),
        total: tx.total.amount(),
        payment_amount: tx.payment_amount.amount(),
        debt: tx.debt.amount(),
        payment_status: status_to_db(tx.payment_status),
        is_active: tx.is_active,
        created_by: tx.created_by.clone(),
        updated_by: tx.updated_by.clone(),
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    };

    let details = tx
        .line_items
        .iter()
        .zip(1..)
        .map(|(line, line_number)| TransactionDetailRow {
            id: line.id.into(),
            transaction_id: tx.id.into(),
            line_number,
            item_id: line.item_id.into(),
            item_name: line.item_name.clone(),
            quantity: line.quantity,
            price: line.price.amount(),
            total: line.total.amount(),
            created_at: line.created_at,
            created_by: line.created_by.clone(),
        })
        .collect();

    (header, details)
}

fn row_to_credit_payment(row: CreditPaymentRow) -> CreditPayment {
    CreditPayment {
        id: row.id.into(),
        invoice_number: row.invoice_number,
        amount: Money::new(row.amount),
        payment_date: row.payment_date,
        notes: row.notes,
        created_at: row.created_at,
        created_by: row.created_by,
        updated_at: row.updated_at,
        updated_by: row.updated_by,
    }
}

fn credit_payment_to_row(credit: &CreditPayment) -> CreditPaymentRow {
    CreditPaymentRow {
        id: credit.id.into(),
        invoice_number: credit.invoice_number.clone(),
        amount: credit.amount.amount(),
        payment_date: credit.payment_date,
        notes: credit.notes.clone(),
        created_at: credit.created_at,
        created_by: credit.created_by.clone(),
        updated_at: credit.updated_at,
        updated_by: credit.updated_by.clone(),
    }
}

fn expenditure_to_row(entry: &ExpenditureEntry) -> ExpenditureRow {
    ExpenditureRow {
        id: entry.id.into(),
        reference: entry.reference.clone(),
        amount: entry.amount.amount(),
        description: entry.description.clone(),
        expenditure_date: entry.date,
        is_active: entry.is_active,
        created_at: entry.created_at,
        created_by: entry.created_by.clone(),
    }
}
