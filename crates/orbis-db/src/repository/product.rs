//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD operations with validation
//! - Lists with derived stock (one batch ledger query per page)
//! - Delete that takes the product's ledger with it
//!
//! ## Why No Stock Column?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ products.current_stock = 7       (drifts from history, races)      │
//! │                                                                         │
//! │  ✅ SUM over stock_movements          (history IS the stock)           │
//! │     list(): products + batch_current_stock(ids)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use orbis_core::validation::{validate_product, validate_search_query};
use orbis_core::{CoreError, Product, ProductDetail, ProductInput, ProductRef, ProductWithStock};

use super::stock::{batch_current_stock, movement_totals};
use super::{generate_id, like_pattern};
use crate::error::{DbError, DbResult, ServiceResult};
use crate::pool::begin_write;

const PRODUCT_COLUMNS: &str =
    "id, name, sku, description, price_cents, cost_cents, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let laptops = repo.list(Some("laptop")).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Validates and inserts a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(Storage(UniqueViolation))` - SKU already exists
    pub async fn create(&self, input: &ProductInput) -> ServiceResult<Product> {
        let input = validate_product(input)?;
        let now = Utc::now();

        let product = Product {
            id: generate_id(),
            name: input.name,
            sku: input.sku,
            description: input.description,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, description,
                price_cents, cost_cents, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_sku(e, &product.sku))?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets several products in one query. Missing ids are skipped.
    pub async fn get_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_ref());
        }
        separated.push_unseparated(") ORDER BY name");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists products by name with their current stock, optionally filtered
    /// by a name/SKU substring.
    pub async fn list(&self, search: Option<&str>) -> ServiceResult<Vec<ProductWithStock>> {
        let pattern = validate_search_query(search)?.map(|q| like_pattern(&q));

        debug!(search = ?pattern, "Listing products");

        let mut conn = self.pool.acquire().await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ?1 IS NULL
               OR name LIKE ?1 ESCAPE '\'
               OR sku LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            "#
        ))
        .bind(pattern)
        .fetch_all(&mut *conn)
        .await?;

        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        let stock = batch_current_stock(&mut conn, &ids).await?;

        Ok(products
            .into_iter()
            .map(|product| {
                let current_stock = stock.get(&product.id).copied().unwrap_or(0);
                ProductWithStock {
                    product,
                    current_stock,
                }
            })
            .collect())
    }

    /// A product with its stock breakdown.
    pub async fn detail(&self, id: &str) -> ServiceResult<Option<ProductDetail>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let totals = movement_totals(&mut conn, &[id]).await?;

        Ok(Some(ProductDetail {
            product,
            stock: orbis_core::stock::StockSummary::from_totals(&totals)?,
        }))
    }

    /// Validates and updates a product.
    pub async fn update(&self, id: &str, input: &ProductInput) -> ServiceResult<Product> {
        let input = validate_product(input)?;
        let now = Utc::now();

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .bind(input.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_sku(e, &input.sku))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Product", id).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    /// Deletes a product and its stock movements in one transaction.
    ///
    /// Fails with a foreign key violation while order lines still reference
    /// the product; nothing is deleted in that case.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        if !product_exists(&mut tx, id).await? {
            return Err(CoreError::not_found("Product", id).into());
        }

        let movements = sqlx::query("DELETE FROM stock_movements WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, movements = movements.rows_affected(), "Product deleted");
        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn duplicate_sku(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku),
        other => other,
    }
}

// =============================================================================
// Transaction-scoped queries
// =============================================================================

/// Whether a product exists, within the caller's transaction.
pub(crate) async fn product_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// Minimal rows for the given product ids. Missing ids are skipped.
pub(crate) async fn product_refs<S: AsRef<str>>(
    conn: &mut SqliteConnection,
    ids: &[S],
) -> DbResult<Vec<ProductRef>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query =
        QueryBuilder::<Sqlite>::new("SELECT id, name, sku, price_cents, is_active FROM products WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.as_ref());
    }
    separated.push_unseparated(")");

    let refs = query
        .build_query_as::<ProductRef>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(refs)
}
