//! # Stock Repository
//!
//! The append-only stock movement ledger.
//!
//! ## Derived Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_movements                         GROUP BY product, type        │
//! │  ┌──────────┬────────────┬─────┐         ┌──────────┬────────────┬─────┐│
//! │  │ product  │ type       │ qty │         │ product  │ type       │ sum ││
//! │  ├──────────┼────────────┼─────┤   ──►   ├──────────┼────────────┼─────┤│
//! │  │ laptop   │ IN         │  10 │         │ laptop   │ IN         │  20 ││
//! │  │ laptop   │ IN         │  10 │         │ laptop   │ OUT        │   4 ││
//! │  │ laptop   │ OUT        │   4 │         │ laptop   │ ADJUSTMENT │  -1 ││
//! │  │ laptop   │ ADJUSTMENT │  -1 │         └──────────┴────────────┴─────┘│
//! │  └──────────┴────────────┴─────┘               │                        │
//! │                                                ▼                        │
//! │                                  orbis_core::stock folds to 15         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Movements are never updated or deleted here; they only disappear with
//! their product (`ON DELETE CASCADE`).

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use orbis_core::stock::{current_by_product, MovementTotal, StockSummary};
use orbis_core::validation::{validate_adjustment, validate_receipt};
use orbis_core::{
    CoreError, NewStockMovement, StockAdjustmentInput, StockMovement, StockMovementType,
};

use super::generate_id;
use super::product::product_exists;
use crate::error::{DbError, DbResult, ServiceResult};
use crate::pool::begin_write;

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Current derived stock. Unknown products and products without
    /// movements report 0.
    pub async fn current_stock(&self, product_id: &str) -> ServiceResult<i64> {
        Ok(self.summary(product_id).await?.current)
    }

    /// Per-type breakdown of a product's stock.
    pub async fn summary(&self, product_id: &str) -> ServiceResult<StockSummary> {
        let mut conn = self.pool.acquire().await?;
        let totals = movement_totals(&mut conn, &[product_id]).await?;

        Ok(StockSummary::from_totals(&totals)?)
    }

    /// Current stock for many products in one query.
    ///
    /// Every requested id is in the map, with 0 when it has no movements.
    pub async fn batch_current_stock<S: AsRef<str>>(
        &self,
        product_ids: &[S],
    ) -> ServiceResult<HashMap<String, i64>> {
        let mut conn = self.pool.acquire().await?;
        batch_current_stock(&mut conn, product_ids).await
    }

    /// Newest-first movement history of a product.
    pub async fn recent_movements(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, note, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Appends one ADJUSTMENT movement (signed, non-zero).
    pub async fn record_adjustment(&self, input: &StockAdjustmentInput) -> ServiceResult<StockMovement> {
        let input = validate_adjustment(input)?;
        self.record(input, StockMovementType::Adjustment).await
    }

    /// Appends one IN movement for goods received.
    pub async fn record_receipt(&self, input: &StockAdjustmentInput) -> ServiceResult<StockMovement> {
        let input = validate_receipt(input)?;
        self.record(input, StockMovementType::In).await
    }

    async fn record(
        &self,
        input: StockAdjustmentInput,
        movement_type: StockMovementType,
    ) -> ServiceResult<StockMovement> {
        let mut tx = begin_write(&self.pool).await?;

        if !product_exists(&mut tx, &input.product_id).await? {
            return Err(CoreError::not_found("Product", &input.product_id).into());
        }

        let mut written = insert_movements(
            &mut tx,
            &[NewStockMovement {
                product_id: input.product_id,
                movement_type,
                quantity: input.quantity,
                note: input.note,
            }],
        )
        .await?;

        tx.commit().await?;

        let movement = written
            .pop()
            .ok_or_else(|| DbError::Internal("movement insert returned nothing".to_string()))?;
        info!(
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            "Stock movement recorded"
        );
        Ok(movement)
    }
}

// =============================================================================
// Transaction-scoped queries
// =============================================================================

/// Grouped `(product_id, movement_type) → SUM(quantity)` rows.
pub(crate) async fn movement_totals<S: AsRef<str>>(
    conn: &mut SqliteConnection,
    product_ids: &[S],
) -> DbResult<Vec<MovementTotal>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT product_id, movement_type, COALESCE(SUM(quantity), 0) AS quantity \
         FROM stock_movements WHERE product_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in product_ids {
        ids.push_bind(id.as_ref());
    }
    ids.push_unseparated(") GROUP BY product_id, movement_type");

    let totals = query
        .build_query_as::<MovementTotal>()
        .fetch_all(&mut *conn)
        .await?;

    debug!(products = product_ids.len(), rows = totals.len(), "Aggregated stock movements");
    Ok(totals)
}

/// Current stock for each requested product, read on the caller's connection.
pub(crate) async fn batch_current_stock<S: AsRef<str>>(
    conn: &mut SqliteConnection,
    product_ids: &[S],
) -> ServiceResult<HashMap<String, i64>> {
    let totals = movement_totals(conn, product_ids).await?;
    Ok(current_by_product(product_ids, &totals)?)
}

/// Appends movements, returning them as stored.
pub(crate) async fn insert_movements(
    conn: &mut SqliteConnection,
    movements: &[NewStockMovement],
) -> DbResult<Vec<StockMovement>> {
    let now = Utc::now();
    let mut written = Vec::with_capacity(movements.len());

    for movement in movements {
        let stored = StockMovement {
            id: generate_id(),
            product_id: movement.product_id.clone(),
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            note: movement.note.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, product_id, movement_type, quantity, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.product_id)
        .bind(stored.movement_type)
        .bind(stored.quantity)
        .bind(&stored.note)
        .bind(stored.created_at)
        .execute(&mut *conn)
        .await?;

        written.push(stored);
    }

    debug!(count = written.len(), "Inserted stock movements");
    Ok(written)
}
