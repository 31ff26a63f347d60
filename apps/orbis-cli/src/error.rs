//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Orbis ERP                              │
//! │                                                                         │
//! │  orbis order confirm <id>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage error? ─── DbError::QueryFailed("...") ────┐           │  │
//! │  │         │               (logged, generic message)    │           │  │
//! │  │         ▼                                            ▼           │  │
//! │  │  Domain error? ─── CoreError::InsufficientStock ── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ─────────────────────────────────────────► JSON stdout │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: {"code":"INSUFFICIENT_STOCK","message":"Only 2 ..."}           │
//! │  exit status 1                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use orbis_core::{CoreError, SalesOrderStatus};
use orbis_db::{DbError, ServiceError};

use crate::config::ConfigError;

/// Error printed when a command fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INVALID_STATE",
///   "message": "Sales order 3f2a… is already confirmed"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripting
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Resource not found
    NotFound,

    /// Order status doesn't allow the operation
    InvalidState,

    /// Confirm of an order without lines
    EmptyOrder,

    /// Not enough stock to confirm
    InsufficientStock,

    /// Database operation failed
    DatabaseError,

    /// Startup configuration is unusable
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// JSON payload written to stderr.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "code": self.code, "message": self.message })
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::ValidationError => 2,
            ErrorCode::ConfigError => 3,
            ErrorCode::DatabaseError => 4,
            _ => 1,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Record is still referenced and can't be removed")
            }
            DbError::Busy => ApiError::new(
                ErrorCode::DatabaseError,
                "Database is busy, try again",
            ),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::InvalidState { order_id, status } => {
                let message = match status {
                    SalesOrderStatus::Confirmed => {
                        format!("Sales order {} is already confirmed", order_id)
                    }
                    SalesOrderStatus::Cancelled => {
                        format!("Sales order {} is cancelled", order_id)
                    }
                    SalesOrderStatus::Draft => {
                        format!("Sales order {} is still a draft", order_id)
                    }
                };
                ApiError::new(ErrorCode::InvalidState, message)
            }
            CoreError::EmptyOrder { order_id } => ApiError::new(
                ErrorCode::EmptyOrder,
                format!("Sales order {} has no lines", order_id),
            ),
            CoreError::InsufficientStock {
                product_name,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} of {} in stock, order needs {}",
                    available, product_name, requested
                ),
            ),
            CoreError::StockOverflow { product_id } => {
                tracing::error!(product_id = %product_id, "Stock ledger sum overflowed");
                ApiError::internal(format!(
                    "Stock of product {} cannot be computed",
                    product_id
                ))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_core::ValidationError;

    #[test]
    fn test_invalid_state_messages_name_the_status() {
        let confirmed: ApiError =
            CoreError::invalid_state("o-1", SalesOrderStatus::Confirmed).into();
        assert_eq!(confirmed.code, ErrorCode::InvalidState);
        assert!(confirmed.message.contains("already confirmed"));

        let cancelled: ApiError =
            CoreError::invalid_state("o-1", SalesOrderStatus::Cancelled).into();
        assert!(cancelled.message.contains("cancelled"));
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err: ApiError = ServiceError::Domain(CoreError::InsufficientStock {
            product_name: "Laptop".to_string(),
            available: 2,
            requested: 3,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 2 of Laptop in stock, order needs 3");
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err: ApiError =
            ServiceError::Storage(DbError::QueryFailed("near \"SELEC\": syntax error".into()))
                .into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_duplicate_sku_is_validation() {
        let err: ApiError = DbError::UniqueViolation {
            field: "sku".to_string(),
            value: "LAP-14".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "sku 'LAP-14' already exists");
    }

    #[test]
    fn test_stock_overflow_is_internal() {
        let err: ApiError = CoreError::StockOverflow {
            product_id: "p-1".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.exit_code(), 1);
        assert!(err.message.contains("p-1"));
    }

    #[test]
    fn test_serialized_shape() {
        let err: ApiError = CoreError::Validation(ValidationError::required("name")).into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "name is required");
    }
}
