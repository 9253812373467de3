//! Transaction headers and details

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Advisory lock namespace for per-day invoice sequencing
const INVOICE_SEQUENCE_LOCK: i32 = 0x4C45_4447;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "tx_direction", rename_all = "snake_case")]
pub enum TxDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum DbPaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TransactionHeaderRow {
    pub id: Uuid,
    pub tx_date: NaiveDate,
    pub invoice_number: String,
    pub direction: TxDirection,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    pub company_name: String,
    pub total: Decimal,
    pub payment_amount: Decimal,
    pub debt: Decimal,
    pub payment_status: DbPaymentStatus,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TransactionDetailRow {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub line_number: i32,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

const HEADER_COLUMNS: &str = r#"
    id, tx_date, invoice_number, direction, customer_id,
    customer_name, customer_address, customer_phone, company_name,
    total, payment_amount, debt, payment_status, is_active,
    created_by, updated_by, created_at, updated_at
"#;

pub async fn insert_header(
    conn: &mut PgConnection,
    row: &TransactionHeaderRow,
) -> Result<(), DatabaseError> {
    sqlx::query(&format!(
        "INSERT INTO transaction_headers ({}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        HEADER_COLUMNS
    ))
    .bind(row.id)
    .bind(row.tx_date)
    .bind(&row.invoice_number)
    .bind(row.direction)
    .bind(row.customer_id)
    .bind(&row.customer_name)
    .bind(&row.customer_address)
    .bind(&row.customer_phone)
    .bind(&row.company_name)
    .bind(row.total)
    .bind(row.payment_amount)
    .bind(row.debt)
    .bind(row.payment_status)
    .bind(row.is_active)
    .bind(&row.created_by)
    .bind(&row.updated_by)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_detail(
    conn: &mut PgConnection,
    row: &TransactionDetailRow,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO transaction_details (
            id, transaction_id, line_number, item_id, item_name,
            quantity, price, total, created_at, created_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(row.id)
    .bind(row.transaction_id)
    .bind(row.line_number)
    .bind(row.item_id)
    .bind(&row.item_name)
    .bind(row.quantity)
    .bind(row.price)
    .bind(row.total)
    .bind(row.created_at)
    .bind(&row.created_by)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Active header by id, optionally row-locked until the enclosing transaction ends
pub async fn fetch_header(
    conn: &mut PgConnection,
    id: Uuid,
    lock: bool,
) -> Result<TransactionHeaderRow, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM transaction_headers WHERE id = $1 AND is_active{}",
        HEADER_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );

    sqlx::query_as::<_, TransactionHeaderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Transaction", id))
}

/// Active header by invoice number, optionally row-locked until the enclosing transaction ends
pub async fn fetch_header_by_invoice(
    conn: &mut PgConnection,
    invoice_number: &str,
    lock: bool,
) -> Result<TransactionHeaderRow, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM transaction_headers WHERE invoice_number = $1 AND is_active{}",
        HEADER_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );

    sqlx::query_as::<_, TransactionHeaderRow>(&sql)
        .bind(invoice_number)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Transaction", invoice_number))
}

/// Details of the given transactions in line order
pub async fn fetch_details(
    conn: &mut PgConnection,
    transaction_ids: &[Uuid],
) -> Result<Vec<TransactionDetailRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, TransactionDetailRow>(
        r#"
        SELECT id, transaction_id, line_number, item_id, item_name,
               quantity, price, total, created_at, created_by
        FROM transaction_details
        WHERE transaction_id = ANY($1)
        ORDER BY transaction_id, line_number
        "#,
    )
    .bind(transaction_ids)
    .fetch_all(&mut *conn)
    .await?)
}

/// Active headers, newest first
pub async fn list_active_headers(
    conn: &mut PgConnection,
    offset: i64,
    limit: i64,
) -> Result<Vec<TransactionHeaderRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, TransactionHeaderRow>(&format!(
        "SELECT {} FROM transaction_headers WHERE is_active \
         ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        HEADER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?)
}

pub async fn count_active(conn: &mut PgConnection) -> Result<i64, DatabaseError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transaction_headers WHERE is_active")
            .fetch_one(&mut *conn)
            .await?,
    )
}

/// Serializes invoice sequencing for `date` until the enclosing transaction ends
pub async fn lock_daily_sequence(conn: &mut PgConnection, date: NaiveDate) -> Result<(), DatabaseError> {
    let day_key = date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32;
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(INVOICE_SEQUENCE_LOCK)
        .bind(day_key)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Number of transactions dated `date`, active or not
pub async fn count_created_on(conn: &mut PgConnection, date: NaiveDate) -> Result<i64, DatabaseError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transaction_headers WHERE tx_date = $1")
            .bind(date)
            .fetch_one(&mut *conn)
            .await?,
    )
}

pub async fn update_payment_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: DbPaymentStatus,
    updated_by: &str,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_headers
        SET payment_status = $2, updated_by = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(updated_by)
    .execute(&mut *conn)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

pub async fn update_payment_amount(
    conn: &mut PgConnection,
    id: Uuid,
    payment_amount: Decimal,
    updated_by: &str,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_headers
        SET payment_amount = $2, updated_by = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(payment_amount)
    .bind(updated_by)
    .execute(&mut *conn)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

pub async fn update_debt(conn: &mut PgConnection, id: Uuid, debt: Decimal) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_headers
        SET debt = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(debt)
    .execute(&mut *conn)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

/// Sum of debt over a customer's active transactions
pub async fn outstanding_debt(conn: &mut PgConnection, customer_id: Uuid) -> Result<Decimal, DatabaseError> {
    Ok(sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(debt), 0)
        FROM transaction_headers
        WHERE customer_id = $1 AND is_active
        "#,
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await?)
}

/// Marks an active header inactive
pub async fn deactivate(conn: &mut PgConnection, id: Uuid, updated_by: &str) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_headers
        SET is_active = FALSE, updated_by = $2, updated_at = NOW()
        WHERE id = $1 AND is_active
        "#,
    )
    .bind(id)
    .bind(updated_by)
    .execute(&mut *conn)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

fn expect_one_row(rows_affected: u64, id: Uuid) -> Result<(), DatabaseError> {
    if rows_affected == 0 {
        Err(DatabaseError::not_found("Transaction", id))
    } else {
        Ok(())
    }
}
