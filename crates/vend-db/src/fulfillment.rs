//! # Sale Fulfillment Engine
//!
//! Turns a [`SaleRequest`] into a committed [`Sale`], or into no change at
//! all.
//!
//! ## Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         make_sale(request)                              │
//! │                                                                         │
//! │  validate_sale_request ──── Err ──► SaleError::Invalid (no storage I/O)│
//! │       │                                                                 │
//! │       ▼        ┌──────────── bounded by sale_timeout ───────────────┐  │
//! │  catalog precheck (optional, plain reads)                          │  │
//! │       │ unknown / inactive ──► SaleError::Rejected                 │  │
//! │       ▼                                                            │  │
//! │  BEGIN                                                             │  │
//! │   ├─ reserve_in(line 0)                                            │  │
//! │   ├─ reserve_in(line 1) ── refused ──► ROLLBACK ──► Rejected{line} │  │
//! │   ├─ ...                                                           │  │
//! │   ├─ insert_in(header + all lines, created_at = now)               │  │
//! │  COMMIT ───────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(Sale)                                                               │
//! │                                                                         │
//! │  Timeout or a dropped future drops the transaction: every decrement    │
//! │  made so far is rolled back.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine keeps no stock of its own. Every decision is made against the
//! stored quantity inside the sale's transaction.

use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use vend_core::validation::validate_sale_request;
use vend_core::{
    CustomerId, LineItemRequest, ManagerId, ProductId, ReservationError, Sale, SaleLineItem,
    SaleRequest, ValidationError,
};

use crate::auth::Authenticator;
use crate::config::{env_millis_or, env_or, ConfigError};
use crate::error::{DbError, ReserveError, SaleError};
use crate::pool::Database;
use crate::repository::inventory::InventoryStore;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one `make_sale` attempt after validation.
    /// Default: 5 seconds
    pub sale_timeout: Duration,

    /// Reject unknown or inactive products with plain reads before opening
    /// the write transaction.
    /// Default: true
    pub catalog_precheck: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sale_timeout: Duration::from_secs(5),
            catalog_precheck: true,
        }
    }
}

impl EngineConfig {
    /// Reads `VEND_SALE_TIMEOUT_MS` and `VEND_CATALOG_PRECHECK`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();
        Ok(EngineConfig {
            sale_timeout: env_millis_or("VEND_SALE_TIMEOUT_MS", defaults.sale_timeout)?,
            catalog_precheck: env_or("VEND_CATALOG_PRECHECK", defaults.catalog_precheck)?,
        })
    }

    pub fn sale_timeout(mut self, timeout: Duration) -> Self {
        self.sale_timeout = timeout;
        self
    }

    pub fn catalog_precheck(mut self, enabled: bool) -> Self {
        self.catalog_precheck = enabled;
        self
    }
}

/// All-or-nothing sale processing over the Inventory Store and the sale
/// repository.
///
/// Cloning shares the underlying pool. Any number of clones may run
/// `make_sale` concurrently.
#[derive(Debug, Clone)]
pub struct SaleFulfillmentEngine {
    pool: SqlitePool,
    catalog: ProductRepository,
    inventory: InventoryStore,
    sales: SaleRepository,
    config: EngineConfig,
}

impl SaleFulfillmentEngine {
    pub fn new(db: &Database, config: EngineConfig) -> Self {
        SaleFulfillmentEngine {
            pool: db.pool().clone(),
            catalog: db.products(),
            inventory: db.inventory(),
            sales: db.sales(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes one sale.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - every line reserved and the sale committed
    /// * `Err(SaleError::Invalid)` - malformed request, storage untouched
    /// * `Err(SaleError::Rejected)` - first refused line; nothing persisted
    /// * `Err(SaleError::Timeout)` - bounded wait expired; nothing persisted
    /// * `Err(SaleError::Storage)` - storage fault; nothing persisted
    ///
    /// Not idempotent: submitting the same request twice makes two sales.
    pub async fn make_sale(&self, request: &SaleRequest) -> Result<Sale, SaleError> {
        validate_sale_request(request)?;

        let started = Instant::now();
        let limit = self.config.sale_timeout;

        match tokio::time::timeout(limit, self.fulfill(request)).await {
            Ok(Ok(sale)) => {
                info!(
                    sale_id = sale.id,
                    manager_id = sale.manager_id,
                    customer_id = sale.customer_id,
                    lines = sale.line_items.len(),
                    total = %sale.total(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sale committed"
                );
                Ok(sale)
            }
            Ok(Err(err)) => {
                match &err {
                    SaleError::Storage(db) => error!(error = %db, "Sale aborted by storage fault"),
                    other => warn!(manager_id = request.manager_id, reason = %other, "Sale rejected"),
                }
                Err(err)
            }
            Err(_) => {
                warn!(
                    manager_id = request.manager_id,
                    timeout_ms = limit.as_millis() as u64,
                    "Sale timed out, transaction rolled back"
                );
                Err(SaleError::Timeout(limit))
            }
        }
    }

    /// Resolves the acting manager from `token`, then runs [`make_sale`](Self::make_sale).
    pub async fn make_sale_as(
        &self,
        auth: &dyn Authenticator,
        token: &str,
        customer_id: CustomerId,
        line_items: Vec<LineItemRequest>,
    ) -> Result<Sale, SaleError> {
        let manager_id = auth.authenticate(token).await?;

        let request = SaleRequest {
            manager_id,
            customer_id,
            line_items,
        };
        self.make_sale(&request).await
    }

    /// Money taken by a manager across all committed sales. Zero if none.
    pub async fn manager_sales_total(&self, manager_id: ManagerId) -> Result<i64, SaleError> {
        match self.sales.manager_sales_total(manager_id).await {
            Ok(total) => Ok(total),
            Err(DbError::Overflow { .. }) => {
                warn!(manager_id, "Manager sales total overflows i64");
                Err(SaleError::TotalOverflow { manager_id })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fulfill(&self, request: &SaleRequest) -> Result<Sale, SaleError> {
        if self.config.catalog_precheck {
            self.precheck(request).await?;
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        for (line, item) in request.line_items.iter().enumerate() {
            if let Err(err) = self
                .inventory
                .reserve_in(&mut tx, item.product_id, item.quantity)
                .await
            {
                if let Err(rollback) = tx.rollback().await {
                    // The dropped connection still discards the transaction.
                    warn!(error = %rollback, "Explicit rollback failed");
                }
                return Err(reservation_failure(line, item.product_id, err));
            }
        }

        let line_items: Vec<SaleLineItem> = request.line_items.iter().map(SaleLineItem::from).collect();

        let sale = match self
            .sales
            .insert_in(
                &mut tx,
                request.manager_id,
                request.customer_id,
                Utc::now(),
                &line_items,
            )
            .await
        {
            Ok(sale) => sale,
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Explicit rollback failed");
                }
                return Err(err.into());
            }
        };

        tx.commit().await.map_err(DbError::from)?;

        Ok(sale)
    }

    /// Plain catalog reads; no lock is taken and nothing is written.
    async fn precheck(&self, request: &SaleRequest) -> Result<(), SaleError> {
        for (line, item) in request.line_items.iter().enumerate() {
            let cause = match self.catalog.get_by_id(item.product_id).await? {
                None => ReservationError::ProductNotFound {
                    product_id: item.product_id,
                },
                Some(product) if !product.is_sellable() => ReservationError::ProductInactive {
                    product_id: item.product_id,
                },
                Some(_) => continue,
            };

            debug!(line, product_id = item.product_id, "Catalog precheck refused line");
            return Err(SaleError::Rejected {
                line,
                product_id: item.product_id,
                cause,
            });
        }
        Ok(())
    }
}

fn reservation_failure(line: usize, product_id: ProductId, err: ReserveError) -> SaleError {
    match err {
        ReserveError::Rejected(cause) => SaleError::Rejected {
            line,
            product_id,
            cause,
        },
        ReserveError::InvalidQuantity { .. } => SaleError::Invalid(ValidationError::MustBePositive {
            field: format!("line_items[{line}].quantity"),
        }),
        ReserveError::Storage(db) => SaleError::Storage(db),
    }
}
