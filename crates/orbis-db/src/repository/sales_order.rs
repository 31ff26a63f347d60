//! # Sales Order Repository
//!
//! Reads of sales orders, plus the statements the lifecycle engine runs
//! inside its write transactions.
//!
//! ## Tables
//! ```text
//! sales_orders 1 ──── * sales_order_lines * ──── 1 products
//!      │                    (position = line order,
//!      │                     ON DELETE CASCADE)
//!      * ──── 1 customers
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use orbis_core::lifecycle::DraftLine;
use orbis_core::validation::validate_search_query;
use orbis_core::{
    CustomerRef, SalesOrder, SalesOrderDetail, SalesOrderLine, SalesOrderLineDetail,
    SalesOrderStatus, SalesOrderSummary, SalesStatusFilter,
};

use super::{generate_id, like_pattern};
use crate::error::{DbResult, ServiceResult};

const ORDER_COLUMNS: &str = "id, customer_id, status, currency, notes, \
     subtotal_cents, tax_cents, total_cents, created_at, updated_at";

/// Read side of sales orders.
#[derive(Debug, Clone)]
pub struct SalesOrderRepository {
    pool: SqlitePool,
}

impl SalesOrderRepository {
    /// Creates a new SalesOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesOrderRepository { pool }
    }

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SalesOrder>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Lines of an order in line order.
    pub async fn lines(&self, order_id: &str) -> DbResult<Vec<SalesOrderLine>> {
        let lines = sqlx::query_as::<_, SalesOrderLine>(
            r#"
            SELECT id, sales_order_id, product_id, position,
                   quantity, unit_price_cents, line_total_cents
            FROM sales_order_lines
            WHERE sales_order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Header, customer summary and lines (with product name and SKU).
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SalesOrderDetail>> {
        let mut conn = self.pool.acquire().await?;

        let Some(order) = fetch_order(&mut conn, id).await? else {
            return Ok(None);
        };

        let customer = sqlx::query_as::<_, CustomerRef>(
            "SELECT id, name, email FROM customers WHERE id = ?1",
        )
        .bind(&order.customer_id)
        .fetch_one(&mut *conn)
        .await?;

        let lines = fetch_line_details(&mut conn, id).await?;

        Ok(Some(SalesOrderDetail {
            order,
            customer,
            lines,
        }))
    }

    /// Newest-first order list.
    ///
    /// ## Filters
    /// - `status`: `All` or one status
    /// - `search`: case-insensitive substring of the customer's name or email
    pub async fn list(
        &self,
        status: SalesStatusFilter,
        search: Option<&str>,
    ) -> ServiceResult<Vec<SalesOrderSummary>> {
        let pattern = validate_search_query(search)?.map(|q| like_pattern(&q));

        debug!(status = ?status, search = ?pattern, "Listing sales orders");

        let orders = sqlx::query_as::<_, SalesOrderSummary>(
            r#"
            SELECT o.id,
                   o.status,
                   o.currency,
                   o.total_cents,
                   o.customer_id,
                   c.name  AS customer_name,
                   c.email AS customer_email,
                   (SELECT COUNT(*) FROM sales_order_lines l
                     WHERE l.sales_order_id = o.id) AS line_count,
                   o.created_at
            FROM sales_orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE (?1 IS NULL OR o.status = ?1)
              AND (?2 IS NULL
                   OR c.name LIKE ?2 ESCAPE '\'
                   OR c.email LIKE ?2 ESCAPE '\')
            ORDER BY o.created_at DESC, o.rowid DESC
            "#,
        )
        .bind(status.status())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SalesOrder>> {
    let order = sqlx::query_as::<_, SalesOrder>(&format!(
        "SELECT {ORDER_COLUMNS} FROM sales_orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

pub(crate) async fn fetch_status(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<SalesOrderStatus>> {
    let status = sqlx::query_scalar::<_, SalesOrderStatus>("SELECT status FROM sales_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(status)
}

pub(crate) async fn fetch_line_details(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<SalesOrderLineDetail>> {
    let lines = sqlx::query_as::<_, SalesOrderLineDetail>(
        r#"
        SELECT l.id,
               l.product_id,
               p.name AS product_name,
               p.sku  AS product_sku,
               l.position,
               l.quantity,
               l.unit_price_cents,
               l.line_total_cents
        FROM sales_order_lines l
        JOIN products p ON p.id = l.product_id
        WHERE l.sales_order_id = ?1
        ORDER BY l.position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &SalesOrder) -> DbResult<()> {
    debug!(id = %order.id, customer_id = %order.customer_id, "Inserting sales order");

    sqlx::query(
        r#"
        INSERT INTO sales_orders (
            id, customer_id, status, currency, notes,
            subtotal_cents, tax_cents, total_cents,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(order.status)
    .bind(&order.currency)
    .bind(&order.notes)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Overwrites the header of a draft. Returns the number of rows changed,
/// 0 when the order is missing or no longer DRAFT.
pub(crate) async fn update_draft_header(
    conn: &mut SqliteConnection,
    order: &SalesOrder,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders SET
            customer_id = ?2,
            currency = ?3,
            notes = ?4,
            subtotal_cents = ?5,
            tax_cents = ?6,
            total_cents = ?7,
            updated_at = ?8
        WHERE id = ?1 AND status = 'DRAFT'
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(&order.currency)
    .bind(&order.notes)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Conditional status change. Returns the number of rows changed, which is
/// 1 only if the order was still in `from`.
pub(crate) async fn transition_status(
    conn: &mut SqliteConnection,
    id: &str,
    from: SalesOrderStatus,
    to: SalesOrderStatus,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        "UPDATE sales_orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn delete_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM sales_order_lines WHERE sales_order_id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Inserts lines with `position` following their order in the slice.
pub(crate) async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
    lines: &[DraftLine],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sales_order_lines (
                id, sales_order_id, product_id, position,
                quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(generate_id())
        .bind(order_id)
        .bind(&line.product_id)
        .bind(position as i64)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.line_total.cents())
        .execute(&mut *conn)
        .await?;
    }

    debug!(order_id = %order_id, count = lines.len(), "Inserted order lines");
    Ok(())
}
