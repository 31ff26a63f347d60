//! # Repository Module
//!
//! Database repository implementations for Orbis ERP.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.products().list(Some("laptop"))                            │
//! │       ▼                                                                 │
//! │  ProductRepository ──────► StockRepository (batch current stock)       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository owns a pool handle. Queries the lifecycle engine must run
//! inside its own transaction are also exposed as `pub(crate)` functions
//! taking a `&mut SqliteConnection`.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD and search
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD with derived stock
//! - [`StockRepository`](stock::StockRepository) - The stock movement ledger
//! - [`SalesOrderRepository`](sales_order::SalesOrderRepository) - Order reads

use uuid::Uuid;

pub mod customer;
pub mod product;
pub mod sales_order;
pub mod stock;

/// Generates a new record ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// `%term%` for a `LIKE ... ESCAPE '\'` clause, with wildcards in the term
/// escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
