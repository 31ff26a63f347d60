//! # Error Types
//!
//! Domain-specific error types for orbis-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orbis-core errors (this file)                                         │
//! │  ├── CoreError        - Lifecycle and lookup failures                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  orbis-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - CoreError | DbError, returned by the engine    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the user sees (code + message)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::SalesOrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant keeps the fields a caller needs to render a specific
/// message, so the presentation layer can branch on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Confirming or cancelling an order that is no longer DRAFT
    /// - Editing the lines of a CONFIRMED or CANCELLED order
    /// - A concurrent writer changed the status first
    #[error("Sales order {order_id} is {status}, operation not allowed")]
    InvalidState {
        order_id: String,
        status: SalesOrderStatus,
    },

    /// Confirm attempted on an order without lines.
    #[error("Sales order {order_id} has no lines to confirm")]
    EmptyOrder { order_id: String },

    /// Not enough derived stock to confirm the order.
    ///
    /// ## User Workflow
    /// ```text
    /// Confirm order (2 × Laptop, 1 × Laptop)
    ///      │
    ///      ▼
    /// Requested per product: Laptop = 3, available = 2
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Laptop", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Laptop in stock, order needs 3"
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Ledger sums for a product no longer fit in an `i64`.
    #[error("Stock figures for product {product_id} exceed the supported range")]
    StockOverflow { product_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error carrying the offending status.
    pub fn invalid_state(order_id: impl Into<String>, status: SalesOrderStatus) -> Self {
        CoreError::InvalidState {
            order_id: order_id.into(),
            status,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write so the caller can point at the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format (e.g., malformed price or email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A computed amount does not fit in the supported range.
    #[error("{field} exceeds the largest supported amount")]
    TooLarge { field: String },

    /// The input references a customer or product that does not exist.
    #[error("{field} refers to an unknown record: {id}")]
    UnknownReference { field: String, id: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a TooLong error for a field.
    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
        }
    }

    /// Creates an UnknownReference error for a field.
    pub fn unknown_reference(field: impl Into<String>, id: impl Into<String>) -> Self {
        ValidationError::UnknownReference {
            field: field.into(),
            id: id.into(),
        }
    }

    /// Returns the name of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustBeNonZero { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::TooLarge { field }
            | ValidationError::UnknownReference { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
