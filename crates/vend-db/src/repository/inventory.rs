//! # Inventory Store
//!
//! Authoritative stock bookkeeping with an atomic check-and-decrement.
//!
//! ## Reservation Primitive
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Reservation Works                              │
//! │                                                                         │
//! │  ❌ WRONG: read, then write (two round trips)                          │
//! │     SELECT quantity FROM products WHERE id = ?     → 5                 │
//! │     UPDATE products SET quantity = 2 WHERE id = ?  ← stale by now      │
//! │     Two buyers both read 5, both write 2: three units oversold.        │
//! │                                                                         │
//! │  ✅ CORRECT: one guarded statement                                     │
//! │     UPDATE products SET quantity = quantity - ?n                       │
//! │     WHERE id = ? AND active = 1 AND quantity >= ?n                     │
//! │                                                                         │
//! │     rows_affected == 1 → reserved                                      │
//! │     rows_affected == 0 → re-read the row (same transaction, still      │
//! │                          holding the write lock) to say why:           │
//! │                          missing / inactive / insufficient             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! SQLite admits a single writer. Every reservation and every absolute
//! stock edit is a write statement, so each check-and-decrement runs
//! indivisibly with respect to all of them. A writer that finds the lock
//! taken waits up to the configured busy timeout.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use vend_core::validation::validate_stock_level;
use vend_core::{ProductId, ReservationError};

use crate::error::{DbError, DbResult, ReserveError};

/// Stock reservation and absolute stock edits.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

impl InventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryStore { pool }
    }

    /// Reserves `quantity` units in a transaction of its own.
    ///
    /// ## Returns
    /// * `Ok(())` - stock decremented and committed
    /// * `Err(ReserveError::Rejected(_))` - not found / inactive / insufficient, nothing changed
    /// * `Err(ReserveError::InvalidQuantity)` - `quantity <= 0`, storage untouched
    pub async fn reserve(&self, product_id: ProductId, quantity: i64) -> Result<(), ReserveError> {
        if quantity <= 0 {
            return Err(ReserveError::InvalidQuantity { requested: quantity });
        }

        let mut tx = self.pool.begin().await?;

        match self.reserve_in(&mut tx, product_id, quantity).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    // The dropped connection still discards the transaction.
                    warn!(error = %rollback, "Explicit rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Reserves `quantity` units on a caller-owned transaction.
    ///
    /// The decrement becomes durable only when the caller commits; rolling
    /// back (or dropping) the transaction returns the units.
    pub async fn reserve_in(
        &self,
        conn: &mut SqliteConnection,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), ReserveError> {
        if quantity <= 0 {
            return Err(ReserveError::InvalidQuantity { requested: quantity });
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity = quantity - ?2,
                updated_at = ?3
            WHERE id = ?1 AND active = 1 AND quantity >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            debug!(product_id, quantity, "Stock reserved");
            return Ok(());
        }

        let row: Option<(i64, bool)> =
            sqlx::query_as("SELECT quantity, active FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;

        let cause = match row {
            None => ReservationError::ProductNotFound { product_id },
            Some((_, false)) => ReservationError::ProductInactive { product_id },
            Some((available, true)) => ReservationError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            },
        };

        debug!(product_id, quantity, reason = %cause, "Reservation refused");
        Err(cause.into())
    }

    /// Sets stock to an absolute level (catalog management path).
    ///
    /// A single write statement, so it orders cleanly against concurrent
    /// reservations: each reservation sees the stock either before or
    /// after the edit, never a mix.
    pub async fn set_quantity(&self, product_id: ProductId, quantity: i64) -> DbResult<()> {
        validate_stock_level(quantity)?;

        let result = sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(product_id)
            .bind(quantity)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        info!(product_id, quantity, "Stock level set");
        Ok(())
    }

    /// Current committed stock, read fresh from storage.
    pub async fn available(&self, product_id: ProductId) -> DbResult<Option<i64>> {
        let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, product};

    fn rejection(err: ReserveError) -> ReservationError {
        match err {
            ReserveError::Rejected(cause) => cause,
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reserve_decrements() {
        let db = memory_db().await;
        let p = product(&db, "Coffee beans", 1500, 10).await;

        db.inventory().reserve(p.id, 4).await.unwrap();

        assert_eq!(db.inventory().available(p.id).await.unwrap(), Some(6));
    }

    #[tokio::test]
    async fn test_reserve_down_to_zero_then_refuse() {
        let db = memory_db().await;
        let p = product(&db, "Last one", 100, 1).await;
        let inventory = db.inventory();

        inventory.reserve(p.id, 1).await.unwrap();
        let cause = rejection(inventory.reserve(p.id, 1).await.unwrap_err());

        assert_eq!(
            cause,
            ReservationError::InsufficientStock {
                product_id: p.id,
                requested: 1,
                available: 0
            }
        );
        assert_eq!(inventory.available(p.id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_insufficient_stock_has_no_side_effect() {
        let db = memory_db().await;
        let p = product(&db, "Flour", 300, 3).await;

        let cause = rejection(db.inventory().reserve(p.id, 5).await.unwrap_err());

        assert_eq!(
            cause,
            ReservationError::InsufficientStock {
                product_id: p.id,
                requested: 5,
                available: 3
            }
        );
        assert_eq!(db.inventory().available(p.id).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_inactive_product_refused() {
        let db = memory_db().await;
        let p = product(&db, "Discontinued", 300, 50).await;
        db.products().set_active(p.id, false).await.unwrap();

        let cause = rejection(db.inventory().reserve(p.id, 1).await.unwrap_err());

        assert_eq!(cause, ReservationError::ProductInactive { product_id: p.id });
        assert_eq!(db.inventory().available(p.id).await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn test_missing_product_refused() {
        let db = memory_db().await;

        let cause = rejection(db.inventory().reserve(77, 1).await.unwrap_err());

        assert_eq!(cause, ReservationError::ProductNotFound { product_id: 77 });
    }

    #[tokio::test]
    async fn test_non_positive_quantity_refused() {
        let db = memory_db().await;
        let p = product(&db, "Salt", 80, 5).await;

        assert!(matches!(
            db.inventory().reserve(p.id, 0).await,
            Err(ReserveError::InvalidQuantity { requested: 0 })
        ));
        assert!(matches!(
            db.inventory().reserve(p.id, -2).await,
            Err(ReserveError::InvalidQuantity { requested: -2 })
        ));
        assert_eq!(db.inventory().available(p.id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_reserve_in_rolled_back_restores_stock() {
        let db = memory_db().await;
        let p = product(&db, "Rice", 500, 8).await;
        let inventory = db.inventory();

        let mut tx = db.pool().begin().await.unwrap();
        inventory.reserve_in(&mut tx, p.id, 5).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(inventory.available(p.id).await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_reserve_keeps_original_error_when_transaction_already_aborted() {
        let db = memory_db().await;
        let p = product(&db, "Frozen", 100, 5).await;
        // RAISE(ROLLBACK) ends the transaction inside SQLite, so the explicit
        // rollback that follows has nothing left to roll back.
        sqlx::query(
            r#"
            CREATE TRIGGER freeze_stock BEFORE UPDATE OF quantity ON products
            BEGIN
                SELECT RAISE(ROLLBACK, 'stock frozen');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        match db.inventory().reserve(p.id, 1).await {
            Err(ReserveError::Storage(DbError::QueryFailed(message))) => {
                assert!(message.contains("stock frozen"), "{message}")
            }
            other => panic!("expected the trigger's failure, got {other:?}"),
        }
        assert_eq!(db.inventory().available(p.id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_set_quantity() {
        let db = memory_db().await;
        let p = product(&db, "Sugar", 250, 2).await;
        let inventory = db.inventory();

        inventory.set_quantity(p.id, 40).await.unwrap();
        assert_eq!(inventory.available(p.id).await.unwrap(), Some(40));

        assert!(matches!(
            inventory.set_quantity(p.id, -1).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            inventory.set_quantity(999, 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(inventory.available(p.id).await.unwrap(), Some(40));
    }
}
