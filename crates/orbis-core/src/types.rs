//! # Domain Types
//!
//! Core domain types used throughout Orbis ERP.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SalesOrder    │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (unique)   │◄┐ │  customer_id ───┼──►│  name           │       │
//! │  │  price_cents    │ │ │  status         │   │  email?         │       │
//! │  │  (NO stock!)    │ │ │  total_cents    │   └─────────────────┘       │
//! │  └────────▲────────┘ │ └────────┬────────┘                              │
//! │           │          │          │ owns                                  │
//! │  ┌────────┴────────┐ │ ┌────────▼────────┐                              │
//! │  │ StockMovement   │ └─┤ SalesOrderLine  │                              │
//! │  │  IN / OUT /     │   │  quantity       │                              │
//! │  │  ADJUSTMENT     │   │  unit_price     │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never stored on the product: it is always derived from the
//! movement ledger (see [`crate::stock`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::stock::StockSummary;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2100 bps = 21% (the default sales tax rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    ///
    /// The value is not range-checked here; configuration goes through
    /// `validate_tax_rate_bps` (0 to 10000). Above 10000 tax can exceed the
    /// subtotal and `Money::calculate_tax` may return `None`.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// There is deliberately no stock column: see [`ProductWithStock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit - unique, stored upper-case.
    pub sku: String,

    pub description: Option<String>,

    /// List price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents, when known.
    pub cost_cents: Option<i64>,

    /// Inactive products stay referenced by old orders but are hidden from pickers.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }
}

/// Minimal product projection used by order lines and existence checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub is_active: bool,
}

/// A product row for list views, with its derived stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: Product,
    pub current_stock: i64,
}

/// A product with its full stock breakdown for the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub stock: StockSummary,
}

/// Product fields supplied by the product form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub is_active: bool,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that sales orders are placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Customer fields supplied by the customer form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer summary shown on order views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Kind of ledger entry.
///
/// | Type         | Quantity            | Contribution |
/// |--------------|---------------------|--------------|
/// | `In`         | positive magnitude  | +quantity    |
/// | `Out`        | positive magnitude  | −quantity    |
/// | `Adjustment` | signed, never zero  | +quantity    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementType {
    In,
    Out,
    Adjustment,
}

impl StockMovementType {
    /// Returns the persisted/serialized name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StockMovementType::In => "IN",
            StockMovementType::Out => "OUT",
            StockMovementType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for StockMovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only entry in the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A movement about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockMovement {
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
    pub note: Option<String>,
}

/// Manual stock movement submitted from the inventory screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustmentInput {
    pub product_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

// =============================================================================
// Sales Order Status
// =============================================================================

/// The lifecycle status of a sales order.
///
/// ```text
///            ┌───────────┐
///            │   DRAFT   │  editable
///            └─────┬─────┘
///          confirm │ cancel
///        ┌─────────┴─────────┐
///        ▼                   ▼
///  ┌───────────┐       ┌───────────┐
///  │ CONFIRMED │       │ CANCELLED │   terminal
///  └───────────┘       └───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
    Cancelled,
}

impl SalesOrderStatus {
    /// Returns the persisted/serialized name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::Draft => "DRAFT",
            SalesOrderStatus::Confirmed => "CONFIRMED",
            SalesOrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, SalesOrderStatus::Draft)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub const fn can_transition_to(&self, next: SalesOrderStatus) -> bool {
        matches!(
            (self, next),
            (SalesOrderStatus::Draft, SalesOrderStatus::Confirmed)
                | (SalesOrderStatus::Draft, SalesOrderStatus::Cancelled)
        )
    }
}

impl Default for SalesOrderStatus {
    fn default() -> Self {
        SalesOrderStatus::Draft
    }
}

impl fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesOrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(SalesOrderStatus::Draft),
            "CONFIRMED" => Ok(SalesOrderStatus::Confirmed),
            "CANCELLED" => Ok(SalesOrderStatus::Cancelled),
            _ => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: "must be DRAFT, CONFIRMED or CANCELLED".to_string(),
            }),
        }
    }
}

/// Status filter of the order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesStatusFilter {
    #[default]
    All,
    Draft,
    Confirmed,
    Cancelled,
}

impl SalesStatusFilter {
    /// Lenient parse: anything that is not a known status means "all".
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::parse::<SalesOrderStatus>) {
            Some(Ok(status)) => status.into(),
            _ => SalesStatusFilter::All,
        }
    }

    /// The concrete status to filter on, if any.
    pub fn status(&self) -> Option<SalesOrderStatus> {
        match self {
            SalesStatusFilter::All => None,
            SalesStatusFilter::Draft => Some(SalesOrderStatus::Draft),
            SalesStatusFilter::Confirmed => Some(SalesOrderStatus::Confirmed),
            SalesStatusFilter::Cancelled => Some(SalesOrderStatus::Cancelled),
        }
    }
}

impl From<SalesOrderStatus> for SalesStatusFilter {
    fn from(status: SalesOrderStatus) -> Self {
        match status {
            SalesOrderStatus::Draft => SalesStatusFilter::Draft,
            SalesOrderStatus::Confirmed => SalesStatusFilter::Confirmed,
            SalesOrderStatus::Cancelled => SalesStatusFilter::Cancelled,
        }
    }
}

// =============================================================================
// Sales Order
// =============================================================================

/// Sales order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrder {
    pub id: String,
    pub customer_id: String,
    pub status: SalesOrderStatus,
    pub currency: String,
    pub notes: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SalesOrder {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a sales order. Unit price is frozen when the line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrderLine {
    pub id: String,
    pub sales_order_id: String,
    pub product_id: String,
    /// 0-based position in the submitted line list.
    pub position: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// A line joined with the product it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrderLineDetail {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub position: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Everything the order detail view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub customer: CustomerRef,
    pub lines: Vec<SalesOrderLineDetail>,
}

/// One row of the order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrderSummary {
    pub id: String,
    pub status: SalesOrderStatus,
    pub currency: String,
    pub total_cents: i64,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub line_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Draft order as submitted by the order editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOrderInput {
    pub customer_id: String,
    pub currency: String,
    pub notes: Option<String>,
    pub lines: Vec<SalesOrderLineInput>,
}

/// One line as submitted by the order editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOrderLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
