//! Companies and customers

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub company_name: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
    pub debt: Decimal,
}

pub async fn fetch_company(conn: &mut PgConnection, id: Uuid) -> Result<CompanyRow, DatabaseError> {
    sqlx::query_as::<_, CompanyRow>(
        r#"
        SELECT id, company_name, address, email, phone_number, is_active
        FROM companies
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Company", id))
}

/// Company referenced by a customer
pub async fn fetch_company_of_customer(
    conn: &mut PgConnection,
    customer_id: Uuid,
) -> Result<CompanyRow, DatabaseError> {
    let company_id: Option<Uuid> =
        sqlx::query_scalar("SELECT company_id FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(&mut *conn)
            .await?;
    let company_id = company_id.ok_or_else(|| DatabaseError::not_found("Customer", customer_id))?;

    fetch_company(conn, company_id).await
}

pub async fn fetch_customer(conn: &mut PgConnection, id: Uuid) -> Result<CustomerRow, DatabaseError> {
    sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT id, company_id, full_name, address, phone_number, debt
        FROM customers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Customer", id))
}

/// Locks a customer row until the enclosing transaction ends and returns its debt
pub async fn lock_customer_debt(conn: &mut PgConnection, id: Uuid) -> Result<Decimal, DatabaseError> {
    sqlx::query_scalar::<_, Decimal>("SELECT debt FROM customers WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))
}

/// Adds `delta` to a customer's debt in a single statement and returns the new value
pub async fn add_customer_debt(
    conn: &mut PgConnection,
    id: Uuid,
    delta: Decimal,
) -> Result<Decimal, DatabaseError> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        UPDATE customers
        SET debt = debt + $2, updated_at = NOW()
        WHERE id = $1
        RETURNING debt
        "#,
    )
    .bind(id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Customer", id))
}

/// Replaces a customer's debt and returns the previous value
pub async fn replace_customer_debt(
    conn: &mut PgConnection,
    id: Uuid,
    debt: Decimal,
) -> Result<Decimal, DatabaseError> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        UPDATE customers c
        SET debt = $2, updated_at = NOW()
        FROM (SELECT id, debt FROM customers WHERE id = $1 FOR UPDATE) previous
        WHERE c.id = previous.id
        RETURNING previous.debt
        "#,
    )
    .bind(id)
    .bind(debt)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Customer", id))
}

pub async fn insert_company(conn: &mut PgConnection, row: &CompanyRow) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO companies (id, company_name, address, email, phone_number, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(row.id)
    .bind(&row.company_name)
    .bind(&row.address)
    .bind(&row.email)
    .bind(&row.phone_number)
    .bind(row.is_active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_customer(conn: &mut PgConnection, row: &CustomerRow) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO customers (id, company_id, full_name, address, phone_number, debt)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(row.id)
    .bind(row.company_id)
    .bind(&row.full_name)
    .bind(&row.address)
    .bind(&row.phone_number)
    .bind(row.debt)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
