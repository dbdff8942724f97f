//! # Repository Module
//!
//! Database repository implementations for Shelf.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │       │  db.products().get_by_id(id)                                    │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / SaleRepository               │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  The same structs implement shelf-core's traits, so the SaleRecorder   │
//! │  and AggregationEngine run on SQLite without knowing it:               │
//! │                                                                         │
//! │    SqliteLedger      → InventoryLedger                                  │
//! │    SaleRepository    → SaleStore + SalesReader                          │
//! │    ProductRepository → CatalogReader                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and valuation
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD
//! - [`SaleRepository`](sale::SaleRepository) - Append-only sale log
//! - [`SqliteLedger`](ledger::SqliteLedger) - Guarded stock movements

pub mod customer;
pub mod ledger;
pub mod product;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};
    use shelf_core::{Product, ProductDraft};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn add_product(db: &Database, sku: &str, quantity: i64, price_cents: i64) -> Product {
        db.products()
            .create(&ProductDraft {
                name: format!("Product {}", sku),
                category: "General".to_string(),
                sku: sku.to_string(),
                quantity,
                price_cents,
                description: String::new(),
                expiry_date: None,
            })
            .await
            .unwrap()
    }
}
