//! # Domain Types
//!
//! Core domain types used by the sale fulfillment core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Inbound (caller-built)              Stored                             │
//! │  ┌─────────────────────┐             ┌─────────────────────┐            │
//! │  │    SaleRequest      │  MakeSale   │        Sale         │            │
//! │  │  manager_id         │ ──────────► │  id, created_at     │            │
//! │  │  customer_id        │             │  manager_id         │            │
//! │  │  line_items[]       │             │  customer_id        │            │
//! │  │   └ LineItemRequest │             │  line_items[]       │            │
//! │  └─────────────────────┘             │   └ SaleLineItem    │            │
//! │                                      └─────────────────────┘            │
//! │                                                                         │
//! │  ┌─────────────────────┐                                                │
//! │  │      Product        │  quantity is the only field the engine         │
//! │  │  id, name           │  mutates, and only through reservation.        │
//! │  │  unit_price         │                                                │
//! │  │  quantity, active   │                                                │
//! │  └─────────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! All ids are SQLite row ids assigned on insert. Zero and negative values
//! never name a real row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

pub type ProductId = i64;
pub type SaleId = i64;
pub type ManagerId = i64;
pub type CustomerId = i64;

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its authoritative stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Catalog price in minor units. Sales carry their own price.
    pub unit_price: i64,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Inactive products cannot be sold.
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.unit_price)
    }

    /// Whether the product may appear on a sale at all (stock aside).
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.active
    }
}

/// Payload for creating a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub active: bool,
}

impl NewProduct {
    /// An active product with the given price and opening stock.
    pub fn new(name: impl Into<String>, unit_price: i64, quantity: i64) -> Self {
        NewProduct {
            name: name.into(),
            unit_price,
            quantity,
            active: true,
        }
    }

    /// Marks the product as not for sale.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// One requested line: which product, how many, at what price.
///
/// `unit_price` is supplied by the caller and stored as-is; the catalog
/// price is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: i64,
}

impl LineItemRequest {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: i64) -> Self {
        LineItemRequest {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_minor(self.unit_price).checked_mul(self.quantity)
    }
}

/// A proposed sale as submitted by the HTTP layer.
///
/// ## Example
/// ```rust
/// use vend_core::SaleRequest;
///
/// let request = SaleRequest::new(1, 2).with_item(10, 2, 1000);
/// assert_eq!(request.line_items.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub manager_id: ManagerId,
    pub customer_id: CustomerId,
    pub line_items: Vec<LineItemRequest>,
}

impl SaleRequest {
    /// Creates a request with no line items yet.
    pub fn new(manager_id: ManagerId, customer_id: CustomerId) -> Self {
        SaleRequest {
            manager_id,
            customer_id,
            line_items: Vec::new(),
        }
    }

    /// Appends a line item.
    pub fn with_item(mut self, product_id: ProductId, quantity: i64, unit_price: i64) -> Self {
        self.line_items
            .push(LineItemRequest::new(product_id, quantity, unit_price));
        self
    }

    /// Sum of all line totals, or `None` if any step overflows.
    pub fn total(&self) -> Option<Money> {
        self.line_items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a committed sale.
///
/// Price is frozen at sale time, independent of later catalog edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price_at_sale: i64,
}

impl SaleLineItem {
    /// Line total. Amounts were overflow-checked before the sale was stored.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.unit_price_at_sale * self.quantity)
    }
}

impl From<&LineItemRequest> for SaleLineItem {
    fn from(item: &LineItemRequest) -> Self {
        SaleLineItem {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price_at_sale: item.unit_price,
        }
    }
}

/// A committed sale with all of its line items.
///
/// Created exactly once, atomically with its lines. Never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub manager_id: ManagerId,
    pub customer_id: CustomerId,
    /// Assigned by the store inside the committing transaction.
    pub created_at: DateTime<Utc>,
    /// In the order the caller supplied them. Never empty.
    pub line_items: Vec<SaleLineItem>,
}

impl Sale {
    pub fn total(&self) -> Money {
        self.line_items.iter().map(SaleLineItem::line_total).sum()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_request_total() {
        let request = SaleRequest::new(1, 1).with_item(1, 2, 1000).with_item(2, 3, 500);
        assert_eq!(request.total(), Some(Money::from_minor(3500)));
    }

    #[test]
    fn test_sale_request_total_overflow() {
        let request = SaleRequest::new(1, 1)
            .with_item(1, 1, i64::MAX)
            .with_item(2, 1, 1);
        assert_eq!(request.total(), None);
    }

    #[test]
    fn test_sale_total_and_count() {
        let sale = Sale {
            id: 1,
            manager_id: 1,
            customer_id: 1,
            created_at: Utc::now(),
            line_items: vec![
                SaleLineItem {
                    product_id: 1,
                    quantity: 2,
                    unit_price_at_sale: 1000,
                },
                SaleLineItem {
                    product_id: 2,
                    quantity: 3,
                    unit_price_at_sale: 500,
                },
            ],
        };
        assert_eq!(sale.total().minor(), 3500);
        assert_eq!(sale.item_count(), 5);
    }

    #[test]
    fn test_line_item_copies_request_price() {
        let request = LineItemRequest::new(5, 4, 250);
        let line = SaleLineItem::from(&request);
        assert_eq!(line.unit_price_at_sale, 250);
        assert_eq!(line.line_total().minor(), 1000);
    }

    #[test]
    fn test_new_product_inactive() {
        let product = NewProduct::new("Tea", 300, 10).inactive();
        assert!(!product.active);
    }

    #[test]
    fn test_sale_request_deserializes() {
        let json = r#"{"manager_id":3,"customer_id":8,"line_items":[{"product_id":1,"quantity":2,"unit_price":150}]}"#;
        let request: SaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request, SaleRequest::new(3, 8).with_item(1, 2, 150));
    }
}
