//! # Connection Pool and Write Transactions
//!
//! Opens the SQLite database, applies pragmas and migrations, and hands out
//! repositories and the order lifecycle engine.
//!
//! ## Readers and Writers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SqlitePool (WAL journal)                         │
//! │                                                                         │
//! │   reads ──────► any pooled connection, never blocked by a writer       │
//! │                                                                         │
//! │   begin_write ─► BEGIN IMMEDIATE                                        │
//! │                    │                                                    │
//! │                    ├─ lock free  ──► transaction owns the write lock   │
//! │                    │                                                    │
//! │                    └─ lock held  ──► wait up to busy_timeout           │
//! │                                        │                                │
//! │                                        ├─ released ──► proceed          │
//! │                                        └─ timeout  ──► DbError::Busy    │
//! │                                                                         │
//! │   Writers run one at a time; each sees every earlier commit.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use orbis_core::{TaxRate, TotalsCalculator};

use crate::error::{DbError, DbResult};
use crate::lifecycle::OrderLifecycle;
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sales_order::SalesOrderRepository;
use crate::repository::stock::StockRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool and pragma settings.
///
/// ## Example
/// ```rust
/// use orbis_db::DbConfig;
/// use std::time::Duration;
///
/// let config = DbConfig::new("/var/lib/orbis/orbis.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections, 8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database file, created on first connect. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Upper bound of pooled connections (default 5).
    pub max_connections: u32,

    /// Connections kept open while idle (default 1).
    pub min_connections: u32,

    /// Wait for a free pooled connection (default 30s).
    pub connect_timeout: Duration,

    /// Idle connections are closed after this long (default 10 min).
    pub idle_timeout: Duration,

    /// How long a writer queues for the write lock before failing with
    /// [`DbError::Busy`] (default 5s).
    pub busy_timeout: Duration,

    /// Apply pending migrations in [`Database::new`] (default on).
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Test configuration. An in-memory database exists only inside its
    /// one connection, so the pool holds exactly one.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig { max_connections, ..self }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        DbConfig { min_connections, ..self }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        DbConfig { connect_timeout, ..self }
    }

    pub fn busy_timeout(self, busy_timeout: Duration) -> Self {
        DbConfig { busy_timeout, ..self }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig { run_migrations, ..self }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new().filename(&self.database_path)
        };

        Ok(base
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // off by default in SQLite; cascades and line→product checks need it
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and lifecycle access.
///
/// Cloning is cheap (the pool is reference counted).
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("orbis.db")).await?;
///
/// let stock = db.stock().current_stock(&product_id).await?;
/// db.orders().confirm(&order_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Prices draft orders; carries the configured tax rate.
    calculator: TotalsCalculator,
}

impl Database {
    /// Connects, applies pragmas (WAL, NORMAL sync, foreign keys, busy
    /// timeout) and runs pending migrations unless disabled.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening database"
        );

        let connect_options = config.connect_options()?;
        debug!(
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Connection options configured"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Database pool created");

        let db = Database {
            pool,
            calculator: TotalsCalculator::default(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Replaces the tax rate used to price orders.
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.calculator = TotalsCalculator::new(rate);
        self
    }

    /// The calculator orders are priced with.
    pub fn calculator(&self) -> TotalsCalculator {
        self.calculator
    }

    /// Runs database migrations. Called by `new()` when enabled.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced queries not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the stock ledger.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Returns the sales order read side.
    pub fn sales_orders(&self) -> SalesOrderRepository {
        SalesOrderRepository::new(self.pool.clone())
    }

    /// Returns the order lifecycle engine (create, update, confirm, cancel).
    pub fn orders(&self) -> OrderLifecycle {
        OrderLifecycle::new(self.pool.clone(), self.calculator)
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Write Transactions
// =============================================================================

/// Opens a write transaction holding the database write lock from the start.
///
/// `BEGIN IMMEDIATE` makes concurrent writers queue (up to `busy_timeout`)
/// instead of reading the same snapshot and racing to upgrade. Every read
/// inside the transaction sees the last committed writer's state.
///
/// Dropping the transaction without `commit()` rolls it back.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    debug!("Write transaction started");
    Ok(tx)
}

// =============================================================================
// Unit Tests
// =============================================================================
