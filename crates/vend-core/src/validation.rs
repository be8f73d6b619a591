//! # Validation Module
//!
//! Input rules checked before any storage access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (external)                                        │
//! │  └── Deserialization, auth middleware                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Sale shape: non-empty, positive quantities, priced lines          │
//! │  └── Catalog writes: names, prices, stock levels                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0) on products                                 │
//! │  └── Foreign keys from line items                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::SaleRequest;
use crate::{MAX_PRODUCT_NAME_LEN, MAX_SALE_LINE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Sale Validators
// =============================================================================

/// Validates a sale request.
///
/// ## Rules
/// - `manager_id` and `customer_id` must be positive row ids
/// - At least one and at most [`MAX_SALE_LINE_ITEMS`] line items
/// - Every `quantity > 0`, every `unit_price >= 0`
/// - Every line total and the sale total fit in `i64`
///
/// The first failing rule is reported.
///
/// ## Example
/// ```rust
/// use vend_core::{validation::validate_sale_request, SaleRequest};
///
/// assert!(validate_sale_request(&SaleRequest::new(1, 1).with_item(1, 1, 0)).is_ok());
/// assert!(validate_sale_request(&SaleRequest::new(1, 1)).is_err());
/// ```
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<()> {
    if request.manager_id <= 0 {
        return Err(ValidationError::must_be_positive("manager_id"));
    }

    if request.customer_id <= 0 {
        return Err(ValidationError::must_be_positive("customer_id"));
    }

    if request.line_items.is_empty() {
        return Err(ValidationError::required("line_items"));
    }

    if request.line_items.len() > MAX_SALE_LINE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "line_items".to_string(),
            max: MAX_SALE_LINE_ITEMS,
        });
    }

    for (idx, item) in request.line_items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::must_be_positive(format!(
                "line_items[{idx}].quantity"
            )));
        }
        if item.unit_price < 0 {
            return Err(ValidationError::must_be_non_negative(format!(
                "line_items[{idx}].unit_price"
            )));
        }
        if item.line_total().is_none() {
            return Err(ValidationError::overflow(format!("line_items[{idx}]")));
        }
    }

    if request.total().is_none() {
        return Err(ValidationError::overflow("total"));
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product name: non-blank, at most [`MAX_PRODUCT_NAME_LEN`] characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a catalog price. Zero is allowed (free items).
pub fn validate_unit_price(unit_price: i64) -> ValidationResult<()> {
    if unit_price < 0 {
        return Err(ValidationError::must_be_non_negative("unit_price"));
    }
    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock_level(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::must_be_non_negative("quantity"));
    }
    Ok(())
}
