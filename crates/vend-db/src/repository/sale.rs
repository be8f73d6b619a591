//! # Sale Repository
//!
//! Persistence for committed sales and their line items.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert_in(tx, ...)          (caller owns the transaction)             │
//! │     │                                                                   │
//! │     ├── INSERT INTO sales (...)             → sale id                  │
//! │     │                                                                   │
//! │     └── INSERT INTO sale_line_items (...)                              │
//! │         VALUES (?, ?, ?, ?, ?), (?, ?, ?, ?, ?), ...                   │
//! │         one parameterized statement for every line                     │
//! │                                                                         │
//! │  Nothing is visible to other connections until the caller commits.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use vend_core::{CustomerId, ManagerId, Money, Sale, SaleId, SaleLineItem, ValidationError};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SaleHeader {
    id: SaleId,
    manager_id: ManagerId,
    customer_id: CustomerId,
    created_at: DateTime<Utc>,
}

impl SaleHeader {
    fn with_items(self, line_items: Vec<SaleLineItem>) -> Sale {
        Sale {
            id: self.id,
            manager_id: self.manager_id,
            customer_id: self.customer_id,
            created_at: self.created_at,
            line_items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnedLineItem {
    sale_id: SaleId,
    #[sqlx(flatten)]
    item: SaleLineItem,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale header and all of its line items on the caller's
    /// transaction.
    ///
    /// Line item prices are stored exactly as given; the catalog is not read.
    pub async fn insert_in(
        &self,
        conn: &mut SqliteConnection,
        manager_id: ManagerId,
        customer_id: CustomerId,
        created_at: DateTime<Utc>,
        line_items: &[SaleLineItem],
    ) -> DbResult<Sale> {
        if line_items.is_empty() {
            return Err(DbError::Validation(ValidationError::Required {
                field: "line_items".to_string(),
            }));
        }

        let header = sqlx::query(
            "INSERT INTO sales (manager_id, customer_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(manager_id)
        .bind(customer_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        let sale_id = header.last_insert_rowid();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO sale_line_items (sale_id, position, product_id, quantity, unit_price_at_sale) ",
        );
        builder.push_values(line_items.iter().enumerate(), |mut row, (position, item)| {
            row.push_bind(sale_id)
                .push_bind(position as i64)
                .push_bind(item.product_id)
                .push_bind(item.quantity)
                .push_bind(item.unit_price_at_sale);
        });
        builder.build().execute(&mut *conn).await?;

        debug!(sale_id, manager_id, lines = line_items.len(), "Sale rows written");

        Ok(Sale {
            id: sale_id,
            manager_id,
            customer_id,
            created_at,
            line_items: line_items.to_vec(),
        })
    }

    /// Gets a committed sale with its line items in request order.
    pub async fn get_by_id(&self, id: SaleId) -> DbResult<Option<Sale>> {
        // One read transaction so header and lines come from the same snapshot.
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, SaleHeader>(
            "SELECT id, manager_id, customer_id, created_at FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(header) = header else {
            tx.commit().await?;
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleLineItem>(
            r#"
            SELECT product_id, quantity, unit_price_at_sale
            FROM sale_line_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(header.with_items(items)))
    }

    /// All sales made by a manager, oldest first.
    pub async fn list_by_manager(&self, manager_id: ManagerId) -> DbResult<Vec<Sale>> {
        let mut tx = self.pool.begin().await?;

        let headers = sqlx::query_as::<_, SaleHeader>(
            r#"
            SELECT id, manager_id, customer_id, created_at
            FROM sales
            WHERE manager_id = ?1
            ORDER BY id
            "#,
        )
        .bind(manager_id)
        .fetch_all(&mut *tx)
        .await?;

        let rows = sqlx::query_as::<_, OwnedLineItem>(
            r#"
            SELECT li.sale_id, li.product_id, li.quantity, li.unit_price_at_sale
            FROM sale_line_items li
            INNER JOIN sales s ON s.id = li.sale_id
            WHERE s.manager_id = ?1
            ORDER BY li.sale_id, li.position
            "#,
        )
        .bind(manager_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_sale: HashMap<SaleId, Vec<SaleLineItem>> = HashMap::new();
        for row in rows {
            by_sale.entry(row.sale_id).or_default().push(row.item);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let items = by_sale.remove(&header.id).unwrap_or_default();
                header.with_items(items)
            })
            .collect())
    }

    /// Sum of `quantity × unit_price_at_sale` over every committed line of
    /// every sale made by `manager_id`. Zero when there are none.
    ///
    /// Each sale's own total was overflow-checked before it was stored, so
    /// SQLite sums per sale and the cross-sale sum is checked here.
    ///
    /// ## Returns
    /// * `Err(DbError::Overflow)` - the total does not fit in `i64`
    pub async fn manager_sales_total(&self, manager_id: ManagerId) -> DbResult<i64> {
        let per_sale: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(li.quantity * li.unit_price_at_sale)
            FROM sale_line_items li
            INNER JOIN sales s ON s.id = li.sale_id
            WHERE s.manager_id = ?1
            GROUP BY li.sale_id
            "#,
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        per_sale
            .into_iter()
            .try_fold(Money::zero(), |acc, total| acc.checked_add(Money::from_minor(total)))
            .map(|total| total.minor())
            .ok_or_else(|| DbError::Overflow {
                what: format!("Sales total of manager {manager_id}"),
            })
    }

    /// Counts committed sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, product};

    fn line(product_id: i64, quantity: i64, price: i64) -> SaleLineItem {
        SaleLineItem {
            product_id,
            quantity,
            unit_price_at_sale: price,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back_in_order() {
        let db = memory_db().await;
        let a = product(&db, "A", 1000, 10).await;
        let b = product(&db, "B", 500, 10).await;
        let repo = db.sales();

        let mut tx = db.pool().begin().await.unwrap();
        let sale = repo
            .insert_in(&mut tx, 3, 9, Utc::now(), &[line(b.id, 3, 500), line(a.id, 2, 1000)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let loaded = repo.get_by_id(sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.manager_id, 3);
        assert_eq!(loaded.customer_id, 9);
        assert_eq!(loaded.line_items, vec![line(b.id, 3, 500), line(a.id, 2, 1000)]);
        assert_eq!(loaded.created_at, sale.created_at);
    }

    #[tokio::test]
    async fn test_uncommitted_sale_is_discarded() {
        let db = memory_db().await;
        let a = product(&db, "A", 1000, 10).await;
        let repo = db.sales();

        let mut tx = db.pool().begin().await.unwrap();
        let sale = repo
            .insert_in(&mut tx, 1, 1, Utc::now(), &[line(a.id, 1, 1000)])
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.get_by_id(sale.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_line_items_refused() {
        let db = memory_db().await;
        let mut tx = db.pool().begin().await.unwrap();

        let err = db
            .sales()
            .insert_in(&mut tx, 1, 1, Utc::now(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_product_violates_foreign_key() {
        let db = memory_db().await;
        let mut tx = db.pool().begin().await.unwrap();

        let err = db
            .sales()
            .insert_in(&mut tx, 1, 1, Utc::now(), &[line(404, 1, 10)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_manager_totals_and_listing() {
        let db = memory_db().await;
        let a = product(&db, "A", 1000, 10).await;
        let b = product(&db, "B", 500, 10).await;
        let repo = db.sales();

        let mut tx = db.pool().begin().await.unwrap();
        repo.insert_in(&mut tx, 7, 1, Utc::now(), &[line(a.id, 2, 1000)])
            .await
            .unwrap();
        repo.insert_in(&mut tx, 7, 2, Utc::now(), &[line(b.id, 3, 500)])
            .await
            .unwrap();
        repo.insert_in(&mut tx, 8, 2, Utc::now(), &[line(b.id, 1, 500)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.manager_sales_total(7).await.unwrap(), 3500);
        assert_eq!(repo.manager_sales_total(8).await.unwrap(), 500);
        assert_eq!(repo.manager_sales_total(99).await.unwrap(), 0);

        let sales = repo.list_by_manager(7).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].line_items, vec![line(a.id, 2, 1000)]);
        assert_eq!(sales[1].line_items, vec![line(b.id, 3, 500)]);
        assert!(repo.list_by_manager(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manager_total_overflow_is_reported_as_overflow() {
        let db = memory_db().await;
        let a = product(&db, "Yacht", 1, 10).await;
        let repo = db.sales();
        let half = i64::MAX / 2 + 1;

        let mut tx = db.pool().begin().await.unwrap();
        repo.insert_in(&mut tx, 1, 1, Utc::now(), &[line(a.id, 1, half)])
            .await
            .unwrap();
        repo.insert_in(&mut tx, 1, 2, Utc::now(), &[line(a.id, 1, half)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(matches!(
            repo.manager_sales_total(1).await,
            Err(DbError::Overflow { .. })
        ));
    }
}
