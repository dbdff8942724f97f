//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD (SKU unique and immutable)
//! - Inventory valuation from a two-column scan
//! - [`CatalogReader`] implementation for the recorder and dashboard
//!
//! Stock levels change here only through direct catalog edits. Sales go
//! through [`SqliteLedger`](super::ledger::SqliteLedger).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shelf_core::ledger::CatalogReader;
use shelf_core::{Money, Product, ProductDraft, StoreError};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, sku, quantity, price_cents,
                   expiry_date, description, created_at, updated_at
            FROM products
            ORDER BY name, sku
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, sku, quantity, price_cents,
                   expiry_date, description, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, sku, quantity, price_cents,
                   expiry_date, description, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product with a generated id.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, draft: &ProductDraft) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: draft.name.trim().to_string(),
            category: draft.category.trim().to_string(),
            sku: draft.sku.trim().to_string(),
            quantity: draft.quantity,
            price_cents: draft.price_cents,
            expiry_date: draft.expiry_date,
            description: draft.description.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, sku, quantity, price_cents,
                expiry_date, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.sku)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(product.expiry_date)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        info!(id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Replaces a product's editable fields.
    ///
    /// The SKU is written back unchanged; a different SKU is refused by the
    /// schema with [`DbError::Immutable`].
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                sku = ?4,
                quantity = ?5,
                price_cents = ?6,
                expiry_date = ?7,
                description = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft.name.trim())
        .bind(draft.category.trim())
        .bind(draft.sku.trim())
        .bind(draft.quantity)
        .bind(draft.price_cents)
        .bind(draft.expiry_date)
        .bind(&draft.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Past sales keep their lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Σ quantity × price over the catalog, in minor units.
    ///
    /// Clamps at `i64::MAX` like [`shelf_core::aggregate::inventory_value`].
    /// SQLite turns an overflowing `quantity * price_cents` into REAL, so the
    /// multiplication stays on this side.
    pub async fn inventory_value_cents(&self) -> DbResult<i64> {
        let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT quantity, price_cents FROM products")
            .fetch_all(&self.pool)
            .await?;

        let total = rows
            .into_iter()
            .fold(Money::zero(), |acc, (quantity, price_cents)| {
                acc.saturating_add(Money::from_cents(quantity.saturating_mul(price_cents)))
            });

        Ok(total.cents())
    }
}

#[async_trait]
impl CatalogReader for ProductRepository {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.get_by_id(id).await?)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.list().await?)
    }

    async fn inventory_value(&self) -> Result<Money, StoreError> {
        Ok(Money::from_cents(self.inventory_value_cents().await?))
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_product, memory_db};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = memory_db().await;
        let created = add_product(&db, "PEN-BLUE", 5, 2500).await;

        let fetched = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "PEN-BLUE");
        assert_eq!(fetched.quantity, 5);
        assert_eq!(fetched.price_cents, 2500);

        let by_sku = db.products().get_by_sku("PEN-BLUE").await.unwrap();
        assert_eq!(by_sku.map(|p| p.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = memory_db().await;
        add_product(&db, "PEN-BLUE", 5, 2500).await;

        let err = db
            .products()
            .create(&ProductDraft {
                name: "Another Pen".to_string(),
                category: "Stationery".to_string(),
                sku: "PEN-BLUE".to_string(),
                quantity: 1,
                price_cents: 100,
                description: String::new(),
                expiry_date: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value } if field == "sku" && value == "PEN-BLUE"
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_sku_immutable() {
        let db = memory_db().await;
        let pen = add_product(&db, "PEN-BLUE", 5, 2500).await;

        let mut draft = ProductDraft {
            name: "Blue Pen (fine)".to_string(),
            category: "Stationery".to_string(),
            sku: "PEN-BLUE".to_string(),
            quantity: 7,
            price_cents: 2600,
            description: "0.5mm".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1),
        };
        let updated = db.products().update(&pen.id, &draft).await.unwrap();
        assert_eq!(updated.name, "Blue Pen (fine)");
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.expiry_date, NaiveDate::from_ymd_opt(2027, 1, 1));

        draft.sku = "PEN-RED".to_string();
        let err = db.products().update(&pen.id, &draft).await.unwrap_err();
        assert!(matches!(err, DbError::Immutable(_)));
    }

    #[tokio::test]
    async fn test_negative_quantity_hits_check_constraint() {
        let db = memory_db().await;
        let pen = add_product(&db, "PEN-BLUE", 5, 2500).await;

        let draft = ProductDraft {
            name: "Blue Pen".to_string(),
            category: "Stationery".to_string(),
            sku: "PEN-BLUE".to_string(),
            quantity: -1,
            price_cents: 2500,
            description: String::new(),
            expiry_date: None,
        };
        let err = db.products().update(&pen.id, &draft).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let db = memory_db().await;
        let pen = add_product(&db, "PEN-BLUE", 5, 2500).await;

        db.products().delete(&pen.id).await.unwrap();
        assert!(db.products().get_by_id(&pen.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&pen.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_inventory_value() {
        let db = memory_db().await;
        assert_eq!(db.products().inventory_value_cents().await.unwrap(), 0);

        add_product(&db, "PEN", 25, 2500).await;
        add_product(&db, "INK", 15, 3500).await;

        let repo = db.products();
        assert_eq!(repo.inventory_value_cents().await.unwrap(), 115000);
        assert_eq!(
            repo.inventory_value().await.unwrap(),
            Money::from_cents(115000)
        );
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_inventory_value_matches_core_on_overflow() {
        let db = memory_db().await;
        add_product(&db, "BULK", 4_000_000_000_000, 5_000_000_000).await;
        add_product(&db, "PEN", 25, 2500).await;

        let repo = db.products();
        let products = repo.list().await.unwrap();

        assert_eq!(repo.inventory_value_cents().await.unwrap(), i64::MAX);
        assert_eq!(
            repo.inventory_value().await.unwrap(),
            shelf_core::aggregate::inventory_value(&products)
        );
    }
}
