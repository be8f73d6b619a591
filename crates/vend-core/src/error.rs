//! # Error Types
//!
//! Domain-specific error types for vend-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vend-core errors (this file)                                          │
//! │  ├── ReservationError - Why a stock reservation was refused            │
//! │  └── ValidationError  - Malformed input, caught before storage         │
//! │                                                                         │
//! │  vend-db errors (separate crate)                                       │
//! │  ├── DbError          - Storage failures                               │
//! │  └── SaleError        - What MakeSale returns to its caller            │
//! │                                                                         │
//! │  Flow: ValidationError ──► SaleError::Invalid                          │
//! │        ReservationError ─► SaleError::Rejected { line, product, .. }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Reservation Error
// =============================================================================

/// Why the Inventory Store refused to reserve stock.
///
/// Every variant is side-effect free: a refused reservation never changes
/// the stored quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    /// No product row with this id.
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// The product exists but has been withdrawn from sale.
    #[error("Product {product_id} is not active")]
    ProductInactive { product_id: ProductId },

    /// Not enough stock to cover the request.
    ///
    /// ## User Workflow
    /// ```text
    /// MakeSale (qty: 5)
    ///      │
    ///      ▼
    /// reserve: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 9, requested: 5, available: 3 }
    ///      │
    ///      ▼
    /// Caller shows: "Only 3 left", adjusts, resubmits
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },
}

impl ReservationError {
    /// The product the refusal is about.
    pub fn product_id(&self) -> ProductId {
        match self {
            ReservationError::ProductNotFound { product_id }
            | ReservationError::ProductInactive { product_id }
            | ReservationError::InsufficientStock { product_id, .. } => *product_id,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage access. Field names use the request's own
/// paths (e.g. `line_items[2].quantity`) so the caller can point at the
/// offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field or collection is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Collection has more entries than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Arithmetic on the value would overflow a 64-bit amount.
    #[error("{field} is too large")]
    Overflow { field: String },
}

impl ValidationError {
    pub(crate) fn required(field: impl Into<String>) -> Self {
        ValidationError::Required { field: field.into() }
    }

    pub(crate) fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive { field: field.into() }
    }

    pub(crate) fn must_be_non_negative(field: impl Into<String>) -> Self {
        ValidationError::MustBeNonNegative { field: field.into() }
    }

    pub(crate) fn overflow(field: impl Into<String>) -> Self {
        ValidationError::Overflow { field: field.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReservationError::InsufficientStock {
            product_id: 9,
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 9: available 3, requested 5"
        );

        let err = ReservationError::ProductInactive { product_id: 4 };
        assert_eq!(err.to_string(), "Product 4 is not active");
    }

    #[test]
    fn test_product_id_accessor() {
        assert_eq!(ReservationError::ProductNotFound { product_id: 11 }.product_id(), 11);
        assert_eq!(
            ReservationError::InsufficientStock {
                product_id: 3,
                requested: 1,
                available: 0
            }
            .product_id(),
            3
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("line_items");
        assert_eq!(err.to_string(), "line_items is required");

        let err = ValidationError::must_be_positive("line_items[0].quantity");
        assert_eq!(err.to_string(), "line_items[0].quantity must be positive");

        let err = ValidationError::TooMany {
            field: "line_items".to_string(),
            max: 100,
        };
        assert_eq!(err.to_string(), "line_items cannot have more than 100 entries");
    }
}
