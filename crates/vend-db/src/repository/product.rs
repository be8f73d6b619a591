//! # Product Repository
//!
//! Catalog access for products: the read side the engine consults for its
//! fast-path checks, plus the management calls the catalog service uses.
//!
//! Stock is deliberately absent from every write here except the opening
//! quantity on insert. Changing stock goes through
//! [`InventoryStore`](super::inventory::InventoryStore).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use vend_core::validation::{validate_product_name, validate_stock_level, validate_unit_price};
use vend_core::{NewProduct, Product, ProductId};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, unit_price, quantity, active, created_at, updated_at";

/// Repository for catalog product operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let tea = repo.insert(&NewProduct::new("Green tea", 350, 40)).await?;
/// let product = repo.get_by_id(tea.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns it with its assigned id.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - blank name, negative price or stock
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_unit_price(product.unit_price)?;
        validate_stock_level(product.quantity)?;

        let name = product.name.trim();
        let now = Utc::now();

        debug!(name = %name, quantity = product.quantity, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, unit_price, quantity, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(name)
        .bind(product.unit_price)
        .bind(product.quantity)
        .bind(product.active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            unit_price: product.unit_price,
            quantity: product.quantity,
            active: product.active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products ordered by id.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Activates or withdraws a product.
    ///
    /// Withdrawn products stay referenced by historical sales; new
    /// reservations against them fail with `ProductInactive`.
    pub async fn set_active(&self, id: ProductId, active: bool) -> DbResult<()> {
        debug!(id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Changes the catalog price. Past sales keep the price they were sold at.
    pub async fn update_price(&self, id: ProductId, unit_price: i64) -> DbResult<()> {
        validate_unit_price(unit_price)?;

        let result = sqlx::query("UPDATE products SET unit_price = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(unit_price)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
