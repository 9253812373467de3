//! Credit payments and the daily expenditure log

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CreditPaymentRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ExpenditureRow {
    pub id: Uuid,
    pub reference: String,
    pub amount: Decimal,
    pub description: String,
    pub expenditure_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

pub async fn insert_credit_payment(
    conn: &mut PgConnection,
    row: &CreditPaymentRow,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO credit_payments (
            id, invoice_number, amount, payment_date, notes,
            created_at, created_by, updated_at, updated_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(row.id)
    .bind(&row.invoice_number)
    .bind(row.amount)
    .bind(row.payment_date)
    .bind(&row.notes)
    .bind(row.created_at)
    .bind(&row.created_by)
    .bind(row.updated_at)
    .bind(&row.updated_by)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn count_for_invoice(conn: &mut PgConnection, invoice_number: &str) -> Result<i64, DatabaseError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM credit_payments WHERE invoice_number = $1")
            .bind(invoice_number)
            .fetch_one(&mut *conn)
            .await?,
    )
}

pub async fn sum_for_invoice(conn: &mut PgConnection, invoice_number: &str) -> Result<Decimal, DatabaseError> {
    Ok(sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM credit_payments WHERE invoice_number = $1",
    )
    .bind(invoice_number)
    .fetch_one(&mut *conn)
    .await?)
}

/// Payments for an invoice, newest first
pub async fn list_for_invoice(
    conn: &mut PgConnection,
    invoice_number: &str,
) -> Result<Vec<CreditPaymentRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, CreditPaymentRow>(
        r#"
        SELECT id, invoice_number, amount, payment_date, notes,
               created_at, created_by, updated_at, updated_by
        FROM credit_payments
        WHERE invoice_number = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(invoice_number)
    .fetch_all(&mut *conn)
    .await?)
}

pub async fn insert_expenditure(conn: &mut PgConnection, row: &ExpenditureRow) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO daily_expenditures (
            id, reference, amount, description, expenditure_date,
            is_active, created_at, created_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(row.id)
    .bind(&row.reference)
    .bind(row.amount)
    .bind(&row.description)
    .bind(row.expenditure_date)
    .bind(row.is_active)
    .bind(row.created_at)
    .bind(&row.created_by)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
