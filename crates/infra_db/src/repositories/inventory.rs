//! Inventory items and stock movement

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InventoryItemRow {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn fetch_item(conn: &mut PgConnection, id: Uuid) -> Result<InventoryItemRow, DatabaseError> {
    sqlx::query_as::<_, InventoryItemRow>(
        r#"
        SELECT id, name, price, stock, is_active, created_at, updated_at
        FROM inventory_items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Inventory item", id))
}

/// Active item, row-locked until the enclosing transaction ends
pub async fn lock_active_item(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<InventoryItemRow, DatabaseError> {
    sqlx::query_as::<_, InventoryItemRow>(
        r#"
        SELECT id, name, price, stock, is_active, created_at, updated_at
        FROM inventory_items
        WHERE id = $1 AND is_active
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Inventory item", id))
}

pub async fn increase_stock(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: Decimal,
) -> Result<Decimal, DatabaseError> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        UPDATE inventory_items
        SET stock = stock + $2, updated_at = NOW()
        WHERE id = $1 AND is_active
        RETURNING stock
        "#,
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Inventory item", id))
}

/// Subtracts `quantity` only while stock stays strictly positive.
///
/// Returns the remaining stock, or `None` when the guard rejected the update.
pub async fn decrease_stock_guarded(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: Decimal,
) -> Result<Option<Decimal>, DatabaseError> {
    Ok(sqlx::query_scalar::<_, Decimal>(
        r#"
        UPDATE inventory_items
        SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1 AND is_active AND stock > $2
        RETURNING stock
        "#,
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?)
}

/// Summed (inbound, outbound) quantities on active transactions dated on or after `since`
pub async fn stock_movement(
    conn: &mut PgConnection,
    item_id: Uuid,
    since: NaiveDate,
) -> Result<(Decimal, Decimal), DatabaseError> {
    Ok(sqlx::query_as::<_, (Decimal, Decimal)>(
        r#"
        SELECT
            COALESCE(SUM(d.quantity) FILTER (WHERE h.direction = 'inbound'), 0),
            COALESCE(SUM(d.quantity) FILTER (WHERE h.direction = 'outbound'), 0)
        FROM transaction_details d
        JOIN transaction_headers h ON h.id = d.transaction_id
        WHERE d.item_id = $1 AND h.is_active AND h.tx_date >= $2
        "#,
    )
    .bind(item_id)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?)
}

pub async fn insert_item(conn: &mut PgConnection, row: &InventoryItemRow) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO inventory_items (id, name, price, stock, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(row.price)
    .bind(row.stock)
    .bind(row.is_active)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
