//! # Database and Sale Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ──► DbError (classified: constraint / busy / pool / ...)  │
//! │                     │                                                   │
//! │  ReservationError ──┼──► ReserveError (Inventory Store)                │
//! │  (vend-core)        │          │                                        │
//! │                     ▼          ▼                                        │
//! │  ValidationError ─► SaleError (Sale Fulfillment Engine)                │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                     ApiError { code, message } ← handed to HTTP layer  │
//! │                     (storage detail logged, never exposed)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use vend_core::{ManagerId, ProductId, ReservationError, ValidationError};

use crate::auth::AuthError;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These wrap sqlx errors and add enough categorization for callers to tell
/// a transient condition (busy, pool exhausted) from a hard failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected before reaching SQL.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Unique constraint violation.
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Line item referencing a product row that no longer exists
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. negative stock).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// An aggregate does not fit in `i64`.
    #[error("{what} exceeds the representable range")]
    Overflow { what: String },

    /// Another writer held the database lock past the busy timeout.
    #[error("Database is busy")]
    Busy,

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy | DbError::PoolExhausted)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint / lock type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraint kinds only in the message text:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("integer overflow") {
                    DbError::Overflow {
                        what: "Aggregate".to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// ReserveError
// =============================================================================

/// Failure of a single stock reservation.
#[derive(Debug, Error)]
pub enum ReserveError {
    /// Business-rule refusal. Nothing was changed.
    #[error(transparent)]
    Rejected(#[from] ReservationError),

    /// `quantity <= 0`; refused before touching storage.
    #[error("Reservation quantity must be positive, got {requested}")]
    InvalidQuantity { requested: i64 },

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for ReserveError {
    fn from(err: sqlx::Error) -> Self {
        ReserveError::Storage(err.into())
    }
}

// =============================================================================
// SaleError
// =============================================================================

/// Outcome of a failed `make_sale`.
///
/// ## Taxonomy
/// ```text
/// Invalid          caller error, storage never touched
/// Rejected         business rule (not found / inactive / insufficient),
///                  everything reserved so far rolled back
/// Unauthenticated  token did not resolve to a manager
/// Timeout          bounded wait expired; transient, nothing persisted
/// TotalOverflow    reporting only: the summed total exceeds i64
/// Storage          commit-level fault; transaction rolled back
/// ```
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("Invalid sale: {0}")]
    Invalid(#[from] ValidationError),

    /// `line` is the zero-based index of the first failing line item.
    #[error("Sale rejected at line {line}: {cause}")]
    Rejected {
        line: usize,
        product_id: ProductId,
        cause: ReservationError,
    },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(AuthError),

    #[error("Sale did not complete within {0:?}")]
    Timeout(Duration),

    /// The manager's lifetime total no longer fits in `i64`.
    #[error("Sales total of manager {manager_id} is too large to report")]
    TotalOverflow { manager_id: ManagerId },

    #[error("Storage fault: {0}")]
    Storage(#[from] DbError),
}

impl SaleError {
    /// Whether resubmitting the identical request could succeed.
    ///
    /// Stock shortfalls and malformed requests are not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            SaleError::Timeout(_) => true,
            SaleError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }

    /// The reservation refusal, if this is a rejection.
    pub fn reservation_cause(&self) -> Option<&ReservationError> {
        match self {
            SaleError::Rejected { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<AuthError> for SaleError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(db) => SaleError::Storage(db),
            other => SaleError::Unauthenticated(other),
        }
    }
}

// =============================================================================
// ApiError
// =============================================================================

/// Error payload handed to the HTTP layer.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Only 2 left of product 7 (requested 3)",
///   "productId": 7,
///   "available": 2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

/// Machine-readable error codes. The HTTP layer owns the status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ProductNotFound,
    ProductInactive,
    InsufficientStock,
    Unauthenticated,
    Timeout,
    TotalOverflow,
    DatabaseError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            product_id: None,
            available: None,
        }
    }
}

impl From<&SaleError> for ApiError {
    fn from(err: &SaleError) -> Self {
        match err {
            SaleError::Invalid(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
            SaleError::Rejected { cause, .. } => ApiError::from(cause),
            SaleError::Unauthenticated(_) => {
                ApiError::new(ErrorCode::Unauthenticated, "Authentication required")
            }
            SaleError::Timeout(_) => ApiError::new(
                ErrorCode::Timeout,
                "Sale could not be completed in time, please retry",
            ),
            SaleError::TotalOverflow { .. } => ApiError::new(ErrorCode::TotalOverflow, err.to_string()),
            SaleError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Sale failed with storage fault");
                ApiError::new(ErrorCode::DatabaseError, "Sale could not be recorded")
            }
        }
    }
}

impl From<&ReservationError> for ApiError {
    fn from(cause: &ReservationError) -> Self {
        let product_id = Some(cause.product_id());
        match cause {
            ReservationError::ProductNotFound { product_id: id } => ApiError {
                product_id,
                ..ApiError::new(ErrorCode::ProductNotFound, format!("Product {} does not exist", id))
            },
            ReservationError::ProductInactive { product_id: id } => ApiError {
                product_id,
                ..ApiError::new(ErrorCode::ProductInactive, format!("Product {} is not for sale", id))
            },
            ReservationError::InsufficientStock {
                product_id: id,
                requested,
                available,
            } => ApiError {
                product_id,
                available: Some(*available),
                ..ApiError::new(
                    ErrorCode::InsufficientStock,
                    format!("Only {} left of product {} (requested {})", available, id, requested),
                )
            },
        }
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

    #[test]
    fn test_rejection_maps_to_insufficient_stock_payload() {
        let err = SaleError::Rejected {
            line: 1,
            product_id: 7,
            cause: ReservationError::InsufficientStock {
                product_id: 7,
                requested: 3,
                available: 2,
            },
        };
        let api = ApiError::from(&err);
        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert_eq!(api.product_id, Some(7));
        assert_eq!(api.available, Some(2));

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["productId"], 7);
    }

    #[test]
    fn test_storage_fault_hides_detail() {
        let err = SaleError::Storage(DbError::QueryFailed("no such table: sales".to_string()));
        let api = ApiError::from(&err);
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert!(!api.message.contains("sales"));

        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("productId").is_none());
    }

    #[test]
    fn test_transient_classification() {
        assert!(SaleError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(SaleError::Storage(DbError::Busy).is_transient());
        assert!(!SaleError::Storage(DbError::QueryFailed("x".into())).is_transient());
        assert!(!SaleError::Rejected {
            line: 0,
            product_id: 1,
            cause: ReservationError::InsufficientStock {
                product_id: 1,
                requested: 2,
                available: 1
            },
        }
        .is_transient());
    }

    #[test]
    fn test_total_overflow_is_not_a_storage_fault() {
        let err = SaleError::TotalOverflow { manager_id: 3 };
        assert!(!err.is_transient());

        let json = serde_json::to_value(ApiError::from(&err)).unwrap();
        assert_eq!(json["code"], "TOTAL_OVERFLOW");
    }

    #[test]
    fn test_auth_storage_error_becomes_storage_fault() {
        let err: SaleError = AuthError::Storage(DbError::Busy).into();
        assert!(matches!(err, SaleError::Storage(DbError::Busy)));

        let err: SaleError = AuthError::UnknownToken.into();
        assert!(matches!(err, SaleError::Unauthenticated(AuthError::UnknownToken)));
    }
}
