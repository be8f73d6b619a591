//! # vend-core: Pure Domain Logic for the Vend Sale Core
//!
//! Types, money arithmetic, errors and validation shared by the storage
//! layer and whatever HTTP front end sits above it. Nothing in here touches
//! a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Vend Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP layer (external collaborator)                 │   │
//! │  │      auth middleware ──► MakeSale / GetManagerSalesTotal        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vend-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │Reservation│  │   sale    │  │   │
//! │  │   │   Sale    │  │           │  │Validation │  │  request  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        vend-db (Inventory Store + Sale Fulfillment Engine)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleRequest, ...)
//! - [`money`] - Integer money in minor currency units
//! - [`error`] - Reservation and validation errors
//! - [`validation`] - Request and catalog input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use vend_core::{validation::validate_sale_request, SaleRequest};
//!
//! let request = SaleRequest::new(7, 42)
//!     .with_item(1, 2, 1000)
//!     .with_item(2, 3, 500);
//!
//! assert!(validate_sale_request(&request).is_ok());
//! assert_eq!(request.total().unwrap().minor(), 3500);
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{ReservationError, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum line items in a single sale.
///
/// Bounds the parameter count of the multi-row line item insert.
pub const MAX_SALE_LINE_ITEMS: usize = 100;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
