//! # vend-db: Storage Layer and Sale Fulfillment Engine
//!
//! SQLite storage (via sqlx) for the Vend sale core: the Inventory Store's
//! atomic reservation primitive, the sale repository, and the engine that
//! ties them into one all-or-nothing transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Vend Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (MakeSale)                                               │
//! │       │  Authenticator::authenticate(token) → manager id               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vend-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   SaleFulfillmentEngine                                         │   │
//! │  │     │ validate → BEGIN                                          │   │
//! │  │     ├──► InventoryStore::reserve_in  (one per line item)        │   │
//! │  │     ├──► SaleRepository::insert_in   (header + all lines)       │   │
//! │  │     └──► COMMIT  (or ROLLBACK on any failure / timeout / drop)  │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) ── SqlitePool ── migrations (embedded)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database, reservation and sale error types
//! - [`repository`] - Catalog, inventory and sale repositories
//! - [`auth`] - Authentication collaborator
//! - [`fulfillment`] - The Sale Fulfillment Engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vend_core::SaleRequest;
//! use vend_db::{Database, DbConfig, EngineConfig};
//!
//! let db = Database::new(DbConfig::new("vend.db")).await?;
//! let engine = db.fulfillment(EngineConfig::default());
//!
//! let sale = engine
//!     .make_sale(&SaleRequest::new(manager_id, customer_id).with_item(product_id, 2, 1000))
//!     .await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use auth::{AuthError, Authenticator, TokenAuthenticator};
pub use config::{ConfigError, Settings};
pub use error::{ApiError, DbError, DbResult, ErrorCode, ReserveError, SaleError};
pub use fulfillment::{EngineConfig, SaleFulfillmentEngine};
pub use pool::{Database, DbConfig};

pub use repository::inventory::InventoryStore;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
