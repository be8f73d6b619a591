//! # Repository Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRepository   catalog rows: insert, read, activate, reprice     │
//! │  InventoryStore      stock: reserve (check-and-decrement), set         │
//! │  SaleRepository      sale headers + line items, manager totals         │
//! │                                                                         │
//! │  Only InventoryStore writes `products.quantity`.                       │
//! │  Methods ending in `_in` run on a caller-owned transaction.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod inventory;
pub mod product;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use vend_core::{ManagerId, NewProduct, Product};

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(db: &Database, name: &str, price: i64, quantity: i64) -> Product {
        db.products()
            .insert(&NewProduct::new(name, price, quantity))
            .await
            .unwrap()
    }

    /// Stands in for the sign-in service that owns `manager_tokens`.
    pub async fn session(db: &Database, token: &str, manager_id: ManagerId) {
        sqlx::query("INSERT INTO manager_tokens (token, manager_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(token)
            .bind(manager_id)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
    }
}
