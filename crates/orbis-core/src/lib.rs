//! # orbis-core: Pure Business Logic for Orbis ERP
//!
//! This crate is the **heart** of Orbis. It contains the business rules of
//! the sales order workflow as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orbis ERP Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation (pages, forms, CLI)                   │   │
//! │  │    Draft editor ──► Order detail ──► Confirm / Cancel buttons   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    orbis-db (Database Layer)                    │   │
//! │  │        repositories, transactions, lifecycle engine             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure decisions                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ orbis-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  money  │ │ totals  │ │  stock  │ │lifecycle │ │validate│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, SalesOrder, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Order totals calculator (line totals, subtotal, tax, total)
//! - [`stock`] - Stock ledger arithmetic (derived stock, summaries)
//! - [`lifecycle`] - Sales order state machine and confirmation planning
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use orbis_core::money::Money;
//! use orbis_core::totals::{OrderLineAmount, TotalsCalculator};
//!
//! let calculator = TotalsCalculator::default(); // 21% tax
//! let totals = calculator.order_totals(&[
//!     OrderLineAmount::new(2, Money::from_cents(149_999)),
//!     OrderLineAmount::new(4, Money::from_cents(32_950)),
//! ]).unwrap();
//!
//! assert_eq!(totals.subtotal.cents(), 431_798);
//! assert_eq!(totals.tax.cents(), 90_678);
//! assert_eq!(totals.total.cents(), 522_476);
//! ```

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use totals::{OrderTotals, TotalsCalculator};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency assigned to a draft when the editor leaves the field blank.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Default sales tax rate in basis points (21%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 2100;

/// Maximum length of an ISO-like currency code on an order.
pub const MAX_CURRENCY_LEN: usize = 8;

/// Maximum length of free-text notes on an order.
pub const MAX_ORDER_NOTES_LEN: usize = 500;

/// Largest quantity on one order line or stock movement.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest unit price or cost in cents (9 999 999 999.99, twelve digits
/// with two decimals).
pub const MAX_PRICE_CENTS: i64 = 999_999_999_999;

/// Maximum length of the note attached to a manual stock movement.
pub const MAX_MOVEMENT_NOTE_LEN: usize = 255;

/// Number of movements shown in a product's recent history.
pub const DEFAULT_MOVEMENT_HISTORY_LIMIT: u32 = 20;
