//! # orbis-db: Persistence and Order Lifecycle for Orbis ERP
//!
//! SQLite storage for customers, products, the stock movement ledger and
//! sales orders, plus the transactional order lifecycle engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orbis ERP Data Flow                              │
//! │                                                                         │
//! │  CLI command (order confirm <id>)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     orbis-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Lifecycle   │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ Customers     │    │ create_draft │  │   │
//! │  │   │ SqlitePool    │◄───│ Products      │◄───│ update_draft │  │   │
//! │  │   │ BEGIN         │    │ Stock ledger  │    │ confirm      │  │   │
//! │  │   │  IMMEDIATE    │    │ Sales orders  │    │ cancel       │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │       SQLite database (WAL), migrations embedded at build       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration and write transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage errors and the combined service error
//! - [`repository`] - Customers, products, stock ledger, sales order reads
//! - [`lifecycle`] - Draft editing, confirmation and cancellation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orbis_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("orbis.db")).await?;
//!
//! let order = db.orders().create_draft(&input).await?;
//! db.orders().confirm(&order.id).await?;
//! let stock = db.stock().current_stock(&product_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use lifecycle::OrderLifecycle;
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sales_order::SalesOrderRepository;
pub use repository::stock::StockRepository;
