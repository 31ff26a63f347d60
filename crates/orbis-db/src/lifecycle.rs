//! # Order Lifecycle Engine
//!
//! Executes the sales order workflow against the database. Business
//! decisions come from [`orbis_core::lifecycle`]; this module supplies the
//! facts and performs the writes atomically.
//!
//! ## Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  confirm(order)                     one BEGIN IMMEDIATE transaction    │
//! │                                                                         │
//! │  ┌── read order + lines ──────────────────────────────────────────┐   │
//! │  │   demand_by_product (DRAFT? lines?)                             │   │
//! │  │   read grouped stock for the demanded products                  │   │
//! │  │   check_availability                                            │   │
//! │  │   UPDATE … SET status='CONFIRMED' WHERE status='DRAFT'  (== 1)  │   │
//! │  │   INSERT one OUT movement per line                              │   │
//! │  └── COMMIT ───────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the write lock is taken before the first read, two confirmations
//! touching the same products run one after the other and the second sees
//! the first one's movements.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use orbis_core::lifecycle::{
    check_availability, demand_by_product, ensure_draft, outbound_movements, DraftOrder,
};
use orbis_core::{
    CoreError, SalesOrder, SalesOrderInput, SalesOrderStatus, TotalsCalculator, ValidationError,
};

use crate::error::{ServiceError, ServiceResult};
use crate::pool::begin_write;
use crate::repository::customer::customer_exists;
use crate::repository::generate_id;
use crate::repository::product::product_refs;
use crate::repository::sales_order::{
    delete_lines, fetch_line_details, fetch_order, fetch_status, insert_lines, insert_order,
    transition_status, update_draft_header,
};
use crate::repository::stock::{batch_current_stock, insert_movements};

/// Sales order lifecycle: create and edit drafts, confirm, cancel.
///
/// ## Usage
/// ```rust,ignore
/// let order = db.orders().create_draft(&input).await?;
/// db.orders().confirm(&order.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderLifecycle {
    pool: SqlitePool,
    calculator: TotalsCalculator,
}

impl OrderLifecycle {
    pub fn new(pool: SqlitePool, calculator: TotalsCalculator) -> Self {
        OrderLifecycle { pool, calculator }
    }

    pub fn calculator(&self) -> TotalsCalculator {
        self.calculator
    }

    /// Creates a DRAFT order with its lines.
    ///
    /// ## Errors
    /// - `Validation` for malformed input or an unknown customer/product
    pub async fn create_draft(&self, input: &SalesOrderInput) -> ServiceResult<SalesOrder> {
        let draft = DraftOrder::prepare(input, &self.calculator)?;
        let now = Utc::now();

        let order = SalesOrder {
            id: generate_id(),
            customer_id: draft.customer_id.clone(),
            status: SalesOrderStatus::Draft,
            currency: draft.currency.clone(),
            notes: draft.notes.clone(),
            subtotal_cents: draft.totals.subtotal.cents(),
            tax_cents: draft.totals.tax.cents(),
            total_cents: draft.totals.total.cents(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = begin_write(&self.pool).await?;

        check_references(&mut tx, &draft).await?;
        insert_order(&mut tx, &order).await?;
        insert_lines(&mut tx, &order.id, &draft.lines).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            lines = draft.lines.len(),
            total_cents = order.total_cents,
            "Draft order created"
        );
        Ok(order)
    }

    /// Replaces header and every line of a DRAFT order.
    ///
    /// ## Errors
    /// - `Validation` for malformed input or an unknown customer/product
    /// - `NotFound` if the order doesn't exist
    /// - `InvalidState` if the order is no longer DRAFT
    pub async fn update_draft(
        &self,
        order_id: &str,
        input: &SalesOrderInput,
    ) -> ServiceResult<SalesOrder> {
        let draft = DraftOrder::prepare(input, &self.calculator)?;

        let mut tx = begin_write(&self.pool).await?;

        let existing = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sales order", order_id))?;
        ensure_draft(order_id, existing.status)?;
        check_references(&mut tx, &draft).await?;

        let order = SalesOrder {
            customer_id: draft.customer_id.clone(),
            currency: draft.currency.clone(),
            notes: draft.notes.clone(),
            subtotal_cents: draft.totals.subtotal.cents(),
            tax_cents: draft.totals.tax.cents(),
            total_cents: draft.totals.total.cents(),
            updated_at: Utc::now(),
            ..existing
        };

        if update_draft_header(&mut tx, &order).await? != 1 {
            return Err(state_changed(&mut tx, order_id).await);
        }
        let removed = delete_lines(&mut tx, order_id).await?;
        insert_lines(&mut tx, order_id, &draft.lines).await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            removed_lines = removed,
            lines = draft.lines.len(),
            total_cents = order.total_cents,
            "Draft order replaced"
        );
        Ok(order)
    }

    /// Confirms a DRAFT order and debits stock, or changes nothing.
    ///
    /// ## Errors
    /// - `NotFound` if the order doesn't exist
    /// - `InvalidState(status)` if it is not DRAFT (including when a
    ///   concurrent caller got there first)
    /// - `EmptyOrder` if it has no lines
    /// - `InsufficientStock` for the first product, in line order, whose
    ///   summed demand exceeds its stock
    pub async fn confirm(&self, order_id: &str) -> ServiceResult<SalesOrder> {
        let mut tx = begin_write(&self.pool).await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sales order", order_id))?;
        let lines = fetch_line_details(&mut tx, order_id).await?;

        let demand = demand_by_product(order_id, order.status, &lines)?;
        let product_ids: Vec<&str> = demand.iter().map(|d| d.product_id.as_str()).collect();
        let stock = batch_current_stock(&mut tx, &product_ids).await?;

        if let Err(err) = check_availability(&demand, &stock) {
            warn!(order_id = %order_id, error = %err, "Order confirmation rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let changed = transition_status(
            &mut tx,
            order_id,
            SalesOrderStatus::Draft,
            SalesOrderStatus::Confirmed,
            now,
        )
        .await?;
        if changed != 1 {
            return Err(state_changed(&mut tx, order_id).await);
        }

        let movements = insert_movements(&mut tx, &outbound_movements(order_id, &lines)).await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            movements = movements.len(),
            "Order confirmed"
        );
        Ok(SalesOrder {
            status: SalesOrderStatus::Confirmed,
            updated_at: now,
            ..order
        })
    }

    /// Cancels a DRAFT order. The ledger is not touched.
    ///
    /// ## Errors
    /// - `NotFound` if the order doesn't exist
    /// - `InvalidState(status)` if it is not DRAFT
    pub async fn cancel(&self, order_id: &str) -> ServiceResult<SalesOrder> {
        let mut tx = begin_write(&self.pool).await?;

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sales order", order_id))?;
        ensure_draft(order_id, order.status)?;

        let now = Utc::now();
        let changed = transition_status(
            &mut tx,
            order_id,
            SalesOrderStatus::Draft,
            SalesOrderStatus::Cancelled,
            now,
        )
        .await?;
        if changed != 1 {
            return Err(state_changed(&mut tx, order_id).await);
        }

        tx.commit().await?;

        info!(order_id = %order_id, "Order cancelled");
        Ok(SalesOrder {
            status: SalesOrderStatus::Cancelled,
            updated_at: now,
            ..order
        })
    }
}

/// Unknown customer or product ids are input errors of the draft editor.
async fn check_references(conn: &mut SqliteConnection, draft: &DraftOrder) -> ServiceResult<()> {
    if !customer_exists(conn, &draft.customer_id).await? {
        return Err(ValidationError::unknown_reference("customerId", &draft.customer_id).into());
    }

    let wanted = draft.product_ids();
    let found = product_refs(conn, &wanted).await?;
    if let Some(missing) = wanted.iter().find(|id| !found.iter().any(|p| &p.id == *id)) {
        return Err(ValidationError::unknown_reference("productId", missing).into());
    }

    Ok(())
}

/// Error for a guarded write that matched no row: the order vanished or its
/// status is no longer DRAFT.
async fn state_changed(conn: &mut SqliteConnection, order_id: &str) -> ServiceError {
    match fetch_status(conn, order_id).await {
        Ok(Some(status)) => CoreError::invalid_state(order_id, status).into(),
        Ok(None) => CoreError::not_found("Sales order", order_id).into(),
        Err(err) => err.into(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{customer_input, product_input, test_db};
    use crate::{Database, DbConfig};
    use orbis_core::{
        Product, SalesOrderLineInput, StockAdjustmentInput, StockMovementType, MAX_PRICE_CENTS,
        MAX_QUANTITY,
    };

    struct Fixture {
        db: Database,
        customer_id: String,
        laptop: Product,
        monitor: Product,
    }

    async fn fixture_on(db: Database) -> Fixture {
        let customer = db
            .customers()
            .create(&customer_input("Ana Silva", Some("ana@example.com")))
            .await
            .unwrap();
        let laptop = db
            .products()
            .create(&product_input("Laptop Pro 14", "LAP-14", 149_999))
            .await
            .unwrap();
        let monitor = db
            .products()
            .create(&product_input("Monitor 27", "MON-27", 32_950))
            .await
            .unwrap();

        Fixture {
            db,
            customer_id: customer.id,
            laptop,
            monitor,
        }
    }

    async fn fixture() -> Fixture {
        fixture_on(test_db().await).await
    }

    fn line(product: &Product, quantity: i64, unit_price_cents: i64) -> SalesOrderLineInput {
        SalesOrderLineInput {
            product_id: product.id.clone(),
            quantity,
            unit_price_cents,
        }
    }

    fn order_input(customer_id: &str, lines: Vec<SalesOrderLineInput>) -> SalesOrderInput {
        SalesOrderInput {
            customer_id: customer_id.to_string(),
            currency: String::new(),
            notes: Some("deliver monday".to_string()),
            lines,
        }
    }

    async fn receive(db: &Database, product: &Product, quantity: i64) {
        db.stock()
            .record_receipt(&StockAdjustmentInput {
                product_id: product.id.clone(),
                quantity,
                note: None,
            })
            .await
            .unwrap();
    }

    async fn movement_count(db: &Database, movement_type: StockMovementType) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE movement_type = ?1")
            .bind(movement_type)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn domain(err: ServiceError) -> CoreError {
        match err {
            ServiceError::Domain(err) => err,
            ServiceError::Storage(err) => panic!("unexpected storage error: {err}"),
        }
    }

    #[tokio::test]
    async fn test_create_draft_computes_totals() {
        let f = fixture().await;

        let order = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![line(&f.laptop, 2, 149_999), line(&f.monitor, 4, 32_950)],
            ))
            .await
            .unwrap();

        assert_eq!(order.status, SalesOrderStatus::Draft);
        assert_eq!(order.currency, "EUR");
        assert_eq!(order.subtotal_cents, 431_798);
        assert_eq!(order.tax_cents, 90_678);
        assert_eq!(order.total_cents, 522_476);

        let stored = f.db.sales_orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.id, order.id);
        assert_eq!(stored.total_cents, order.total_cents);
        assert_eq!(stored.notes.as_deref(), Some("deliver monday"));
        let lines = f.db.sales_orders().lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total_cents, 299_998);
        assert_eq!(lines[1].line_total_cents, 131_800);
    }

    #[tokio::test]
    async fn test_create_draft_rejects_unknown_references() {
        let f = fixture().await;

        let err = f
            .db
            .orders()
            .create_draft(&order_input("nobody", vec![line(&f.laptop, 1, 100)]))
            .await
            .unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::Validation(ValidationError::unknown_reference("customerId", "nobody"))
        );

        let mut input = order_input(&f.customer_id, vec![line(&f.laptop, 1, 100)]);
        input.lines.push(SalesOrderLineInput {
            product_id: "ghost".to_string(),
            quantity: 1,
            unit_price_cents: 100,
        });
        let err = f.db.orders().create_draft(&input).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::Validation(ValidationError::unknown_reference("productId", "ghost"))
        );

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn test_create_draft_rejects_amounts_that_overflow() {
        let f = fixture().await;

        let err = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![line(&f.laptop, 3, i64::MAX / 2)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            domain(err),
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. })
                if field == "lines[0].unitPrice"
        ));

        let err = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![line(&f.laptop, MAX_QUANTITY, MAX_PRICE_CENTS); 10],
            ))
            .await
            .unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::Validation(ValidationError::TooLarge {
                field: "subtotal".to_string()
            })
        );

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn test_confirm_debits_stock_one_movement_per_line() {
        let f = fixture().await;
        receive(&f.db, &f.laptop, 5).await;
        receive(&f.db, &f.monitor, 4).await;

        let order = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![
                    line(&f.laptop, 2, 149_999),
                    line(&f.monitor, 4, 32_950),
                    line(&f.laptop, 1, 149_999),
                ],
            ))
            .await
            .unwrap();

        let confirmed = f.db.orders().confirm(&order.id).await.unwrap();
        assert_eq!(confirmed.status, SalesOrderStatus::Confirmed);

        assert_eq!(movement_count(&f.db, StockMovementType::Out).await, 3);
        assert_eq!(f.db.stock().current_stock(&f.laptop.id).await.unwrap(), 2);
        assert_eq!(f.db.stock().current_stock(&f.monitor.id).await.unwrap(), 0);

        let history = f.db.stock().recent_movements(&f.laptop.id, 20).await.unwrap();
        let note = format!("Sale order {}", order.id);
        assert_eq!(history[0].note.as_deref(), Some(note.as_str()));

        let err = f.db.orders().confirm(&order.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::invalid_state(&order.id, SalesOrderStatus::Confirmed)
        );
        assert_eq!(movement_count(&f.db, StockMovementType::Out).await, 3);
    }

    #[tokio::test]
    async fn test_confirm_with_summed_shortage_changes_nothing() {
        let f = fixture().await;
        receive(&f.db, &f.laptop, 2).await;
        receive(&f.db, &f.monitor, 1).await;

        // 2 + 1 laptops requested, 2 in stock; the monitor is short too but
        // appears later.
        let order = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![
                    line(&f.laptop, 2, 149_999),
                    line(&f.monitor, 3, 32_950),
                    line(&f.laptop, 1, 149_999),
                ],
            ))
            .await
            .unwrap();

        let err = f.db.orders().confirm(&order.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::InsufficientStock {
                product_name: "Laptop Pro 14".to_string(),
                available: 2,
                requested: 3,
            }
        );

        let stored = f.db.sales_orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SalesOrderStatus::Draft);
        assert_eq!(movement_count(&f.db, StockMovementType::Out).await, 0);
        assert_eq!(f.db.stock().current_stock(&f.laptop.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_confirm_missing_and_empty_orders() {
        let f = fixture().await;

        let err = f.db.orders().confirm("missing").await.unwrap_err();
        assert!(matches!(domain(err), CoreError::NotFound { .. }));

        let order = f
            .db
            .orders()
            .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 1, 100)]))
            .await
            .unwrap();
        sqlx::query("DELETE FROM sales_order_lines WHERE sales_order_id = ?1")
            .bind(&order.id)
            .execute(f.db.pool())
            .await
            .unwrap();

        let err = f.db.orders().confirm(&order.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::EmptyOrder {
                order_id: order.id.clone()
            }
        );
    }

    #[tokio::test]
    async fn test_cancel_transitions() {
        let f = fixture().await;
        receive(&f.db, &f.laptop, 10).await;

        let draft = f
            .db
            .orders()
            .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 1, 100)]))
            .await
            .unwrap();
        let cancelled = f.db.orders().cancel(&draft.id).await.unwrap();
        assert_eq!(cancelled.status, SalesOrderStatus::Cancelled);
        assert_eq!(f.db.stock().current_stock(&f.laptop.id).await.unwrap(), 10);

        let err = f.db.orders().cancel(&draft.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::invalid_state(&draft.id, SalesOrderStatus::Cancelled)
        );
        let err = f.db.orders().confirm(&draft.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::invalid_state(&draft.id, SalesOrderStatus::Cancelled)
        );

        let confirmed = f
            .db
            .orders()
            .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 1, 100)]))
            .await
            .unwrap();
        f.db.orders().confirm(&confirmed.id).await.unwrap();
        let err = f.db.orders().cancel(&confirmed.id).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::invalid_state(&confirmed.id, SalesOrderStatus::Confirmed)
        );

        let err = f.db.orders().cancel("missing").await.unwrap_err();
        assert!(matches!(domain(err), CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_draft_replaces_lines() {
        let f = fixture().await;
        let order = f
            .db
            .orders()
            .create_draft(&order_input(
                &f.customer_id,
                vec![line(&f.laptop, 1, 149_999), line(&f.monitor, 1, 32_950)],
            ))
            .await
            .unwrap();
        let old_lines = f.db.sales_orders().lines(&order.id).await.unwrap();

        let mut input = order_input(&f.customer_id, vec![line(&f.monitor, 3, 30_000)]);
        input.currency = "usd".to_string();
        input.notes = None;
        let updated = f.db.orders().update_draft(&order.id, &input).await.unwrap();

        assert_eq!(updated.id, order.id);
        assert_eq!(updated.status, SalesOrderStatus::Draft);
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.notes, None);
        assert_eq!(updated.subtotal_cents, 90_000);
        assert_eq!(updated.tax_cents, 18_900);
        assert_eq!(updated.total_cents, 108_900);

        let lines = f.db.sales_orders().lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, f.monitor.id);
        assert!(old_lines.iter().all(|old| old.id != lines[0].id));
    }

    #[tokio::test]
    async fn test_update_draft_rejects_non_draft_and_missing() {
        let f = fixture().await;
        receive(&f.db, &f.laptop, 1).await;

        let order = f
            .db
            .orders()
            .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 1, 149_999)]))
            .await
            .unwrap();
        f.db.orders().confirm(&order.id).await.unwrap();
        let before = f.db.sales_orders().lines(&order.id).await.unwrap();

        let input = order_input(&f.customer_id, vec![line(&f.monitor, 2, 100)]);
        let err = f.db.orders().update_draft(&order.id, &input).await.unwrap_err();
        assert_eq!(
            domain(err),
            CoreError::invalid_state(&order.id, SalesOrderStatus::Confirmed)
        );
        assert_eq!(f.db.sales_orders().lines(&order.id).await.unwrap(), before);

        let err = f.db.orders().update_draft("missing", &input).await.unwrap_err();
        assert!(matches!(domain(err), CoreError::NotFound { .. }));

        let err = f
            .db
            .orders()
            .update_draft(&order.id, &order_input(&f.customer_id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(domain(err), CoreError::Validation(_)));
    }

    // -------------------------------------------------------------------------
    // Concurrency (on-disk database, several pooled connections)
    // -------------------------------------------------------------------------

    struct TempDb {
        path: std::path::PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("orbis-test-{}.db", generate_id()));
            TempDb { path }
        }

        async fn open(&self) -> Database {
            Database::new(DbConfig::new(&self.path).max_connections(4))
                .await
                .unwrap()
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_confirms_of_one_order() {
        let temp = TempDb::new();
        let f = fixture_on(temp.open().await).await;
        receive(&f.db, &f.laptop, 1).await;

        let order = f
            .db
            .orders()
            .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 1, 149_999)]))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            tokio::spawn({
                let orders = f.db.orders();
                let id = order.id.clone();
                async move { orders.confirm(&id).await }
            }),
            tokio::spawn({
                let orders = f.db.orders();
                let id = order.id.clone();
                async move { orders.confirm(&id).await }
            }),
        );
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(
            domain(failure),
            CoreError::invalid_state(&order.id, SalesOrderStatus::Confirmed)
        );

        assert_eq!(movement_count(&f.db, StockMovementType::Out).await, 1);
        assert_eq!(f.db.stock().current_stock(&f.laptop.id).await.unwrap(), 0);

        f.db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_orders_never_oversell() {
        let temp = TempDb::new();
        let f = fixture_on(temp.open().await).await;
        receive(&f.db, &f.laptop, 3).await;

        let mut ids = Vec::new();
        for _ in 0..4 {
            let order = f
                .db
                .orders()
                .create_draft(&order_input(&f.customer_id, vec![line(&f.laptop, 2, 149_999)]))
                .await
                .unwrap();
            ids.push(order.id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let orders = f.db.orders();
                tokio::spawn(async move { orders.confirm(&id).await })
            })
            .collect();

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(err) => assert!(matches!(
                    domain(err),
                    CoreError::InsufficientStock { requested: 2, available: 1, .. }
                )),
            }
        }

        assert_eq!(confirmed, 1);
        assert_eq!(f.db.stock().current_stock(&f.laptop.id).await.unwrap(), 1);

        f.db.close().await;
    }
}
