//! # In-Memory Stores
//!
//! Process-local implementations of the ledger and store traits.
//!
//! Used by tests and by anyone embedding the recorder without SQLite.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products: RwLock<BTreeMap<id, Arc<Mutex<Product>>>>                   │
//! │                                                                         │
//! │  decrement_batch([(B,2),(A,1)])                                         │
//! │    1. consolidate          → [(A,1),(B,2)]   sorted by id              │
//! │    2. read-lock map, clone → [Arc A, Arc B]  map lock released         │
//! │    3. lock A, then lock B  (always ascending, so no lock cycles)       │
//! │    4. check every line     → shortfalls? release, report them all      │
//! │    5. apply every line     → release                                   │
//! │                                                                         │
//! │  Two batches that share no product never wait on each other.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{LedgerError, StoreError};
use crate::ledger::{consolidate, CatalogReader, InventoryLedger, SaleStore, SalesReader};
use crate::money::Money;
use crate::types::{Availability, Product, Sale, SaleLine, SaleTotal, StockMovement, StockShortfall};

fn lock(product: &Mutex<Product>) -> MutexGuard<'_, Product> {
    product.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Catalog
// =============================================================================

/// Product catalog with per-product locks.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<BTreeMap<String, Arc<Mutex<Product>>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product with a fresh id and returns a copy of it.
    pub fn add_product(&self, sku: &str, name: &str, quantity: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: "General".to_string(),
            sku: sku.to_string(),
            quantity,
            price_cents,
            expiry_date: None,
            description: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.insert(product.clone());
        product
    }

    /// Inserts or replaces a product under its id.
    pub fn insert(&self, product: Product) {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        products.insert(product.id.clone(), Arc::new(Mutex::new(product)));
    }

    /// Current quantity-on-hand, `None` for unknown products.
    pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
        self.handle(product_id).map(|p| lock(&p).quantity)
    }

    fn handle(&self, product_id: &str) -> Option<Arc<Mutex<Product>>> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        products.get(product_id).cloned()
    }

    /// Resolves every movement's product, in movement order.
    fn handles(&self, movements: &[StockMovement]) -> Result<Vec<Arc<Mutex<Product>>>, LedgerError> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        movements
            .iter()
            .map(|m| {
                products
                    .get(&m.product_id)
                    .cloned()
                    .ok_or_else(|| LedgerError::ProductNotFound(m.product_id.clone()))
            })
            .collect()
    }

    /// Two-phase decrement under per-product locks. Movements must be consolidated.
    fn apply_decrements(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let handles = self.handles(movements)?;
        let mut guards: Vec<MutexGuard<'_, Product>> = handles.iter().map(|h| lock(h)).collect();

        let shortfalls: Vec<StockShortfall> = guards
            .iter()
            .zip(movements)
            .filter(|(product, movement)| !product.can_sell(movement.quantity))
            .map(|(product, movement)| StockShortfall {
                product_id: product.id.clone(),
                sku: product.sku.clone(),
                available: product.quantity,
                requested: movement.quantity,
            })
            .collect();

        if !shortfalls.is_empty() {
            return Err(LedgerError::InsufficientStock(shortfalls));
        }

        let now = Utc::now();
        for (product, movement) in guards.iter_mut().zip(movements) {
            product.quantity -= movement.quantity;
            product.updated_at = now;
        }

        Ok(())
    }

    fn apply_restock(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let handles = self.handles(movements)?;
        let mut guards: Vec<MutexGuard<'_, Product>> = handles.iter().map(|h| lock(h)).collect();

        let restocked: Vec<i64> = guards
            .iter()
            .zip(movements)
            .map(|(product, movement)| {
                product
                    .quantity
                    .checked_add(movement.quantity)
                    .ok_or_else(|| LedgerError::InvalidQuantity {
                        product_id: product.id.clone(),
                        quantity: movement.quantity,
                    })
            })
            .collect::<Result<_, _>>()?;

        let now = Utc::now();
        for (product, quantity) in guards.iter_mut().zip(restocked) {
            product.quantity = quantity;
            product.updated_at = now;
        }

        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryCatalog {
    async fn check_availability(
        &self,
        product_id: &str,
        requested: i64,
    ) -> Result<Availability, LedgerError> {
        let current = self
            .quantity_of(product_id)
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))?;

        if current >= requested {
            Ok(Availability::Available)
        } else {
            Ok(Availability::Insufficient { current, requested })
        }
    }

    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), LedgerError> {
        let movement = [StockMovement::new(product_id, quantity)];
        let movements = consolidate(&movement)?;
        self.apply_decrements(&movements).map_err(|err| match err {
            LedgerError::InsufficientStock(mut shortfalls) if shortfalls.len() == 1 => {
                LedgerError::OutOfRange(shortfalls.remove(0))
            }
            other => other,
        })
    }

    async fn decrement_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let movements = consolidate(movements)?;
        self.apply_decrements(&movements)
    }

    async fn restock_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let movements = consolidate(movements)?;
        self.apply_restock(&movements)
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.handle(id).map(|p| lock(&p).clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let handles: Vec<Arc<Mutex<Product>>> = {
            let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
            products.values().cloned().collect()
        };
        let mut products: Vec<Product> = handles.iter().map(|h| lock(h).clone()).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Append-only sale list.
#[derive(Debug, Default)]
pub struct InMemorySales {
    sales: RwLock<Vec<Sale>>,
    fail_inserts: AtomicBool,
}

impl InMemorySales {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following insert fail until switched back.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.sales.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a single-line sale at `created_at`. For fixtures.
    pub fn push_total(&self, created_at: DateTime<Utc>, total_cents: i64) {
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: "walk-in".to_string(),
            items: vec![SaleLine {
                product_id: "fixture".to_string(),
                quantity: 1,
                unit_price_cents: total_cents,
            }],
            total_cents,
            created_at,
        };
        self.sales
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sale);
    }
}

#[async_trait]
impl SaleStore for InMemorySales {
    async fn insert(&self, sale: &Sale) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("sale store rejected insert".to_string()));
        }

        let mut sales = self.sales.write().unwrap_or_else(PoisonError::into_inner);
        if sales.iter().any(|s| s.id == sale.id) {
            return Err(StoreError::Duplicate {
                field: "id".to_string(),
                value: sale.id.clone(),
            });
        }
        sales.push(sale.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Sale>, StoreError> {
        let sales = self.sales.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sales.iter().find(|s| s.id == id).cloned())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Sale>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let sales = self.sales.read().unwrap_or_else(PoisonError::into_inner);
        let mut recent: Vec<Sale> = sales.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[async_trait]
impl SalesReader for InMemorySales {
    async fn sale_totals_between(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SaleTotal>, StoreError> {
        let sales = self.sales.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sales
            .iter()
            .filter(|s| s.created_at >= from && to.map_or(true, |to| s.created_at < to))
            .map(|s| SaleTotal {
                created_at: s.created_at,
                total: Money::from_cents(s.total_cents),
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_availability() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 5, 100);

        assert_eq!(
            catalog.check_availability(&pen.id, 5).await.unwrap(),
            Availability::Available
        );
        assert_eq!(
            catalog.check_availability(&pen.id, 6).await.unwrap(),
            Availability::Insufficient {
                current: 5,
                requested: 6
            }
        );
        assert!(matches!(
            catalog.check_availability("missing", 1).await,
            Err(LedgerError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 2, 100);

        let err = catalog.decrement(&pen.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::OutOfRange(ref s) if s.available == 2 && s.requested == 3
        ));
        assert_eq!(catalog.quantity_of(&pen.id), Some(2));

        catalog.decrement(&pen.id, 2).await.unwrap();
        assert_eq!(catalog.quantity_of(&pen.id), Some(0));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing_and_reports_every_shortfall() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 10, 100);
        let ink = catalog.add_product("INK", "Ink", 1, 100);
        let pad = catalog.add_product("PAD", "Pad", 0, 100);

        let err = catalog
            .decrement_batch(&[
                StockMovement::new(&pen.id, 4),
                StockMovement::new(&ink.id, 2),
                StockMovement::new(&pad.id, 1),
            ])
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientStock(shortfalls) => {
                let mut skus: Vec<&str> = shortfalls.iter().map(|s| s.sku.as_str()).collect();
                skus.sort_unstable();
                assert_eq!(skus, vec!["INK", "PAD"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(catalog.quantity_of(&pen.id), Some(10));
        assert_eq!(catalog.quantity_of(&ink.id), Some(1));
    }

    #[tokio::test]
    async fn test_batch_merges_duplicate_lines() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 5, 100);

        // 3 + 3 exceeds 5 even though each line alone fits.
        let err = catalog
            .decrement_batch(&[StockMovement::new(&pen.id, 3), StockMovement::new(&pen.id, 3)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock(ref s) if s[0].requested == 6
        ));
        assert_eq!(catalog.quantity_of(&pen.id), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_product_fails_batch() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 5, 100);

        let err = catalog
            .decrement_batch(&[StockMovement::new(&pen.id, 1), StockMovement::new("ghost", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(ref id) if id == "ghost"));
        assert_eq!(catalog.quantity_of(&pen.id), Some(5));
    }

    #[tokio::test]
    async fn test_restock_reverses_decrement() {
        let catalog = InMemoryCatalog::new();
        let pen = catalog.add_product("PEN", "Pen", 5, 100);
        let lines = [StockMovement::new(&pen.id, 3)];

        catalog.decrement_batch(&lines).await.unwrap();
        assert_eq!(catalog.quantity_of(&pen.id), Some(2));

        catalog.restock_batch(&lines).await.unwrap();
        assert_eq!(catalog.quantity_of(&pen.id), Some(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_never_oversell() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let pen = catalog.add_product("PEN", "Pen", 20, 100);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let catalog = catalog.clone();
                let id = pen.id.clone();
                tokio::spawn(async move {
                    catalog
                        .decrement_batch(&[StockMovement::new(id, 1)])
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 20);
        assert_eq!(catalog.quantity_of(&pen.id), Some(0));
    }

    #[tokio::test]
    async fn test_sales_store_window_and_recent() {
        let sales = InMemorySales::new();
        let early = Utc::now() - chrono::Duration::hours(2);
        let late = Utc::now();
        sales.push_total(early, 100);
        sales.push_total(late, 200);

        let recent = sales.recent(10).await.unwrap();
        assert_eq!(recent[0].total_cents, 200);
        assert_eq!(sales.recent(1).await.unwrap().len(), 1);

        let totals = sales
            .sale_totals_between(early, Some(late))
            .await
            .unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total.cents(), 100);
    }

    #[tokio::test]
    async fn test_failing_inserts() {
        let sales = InMemorySales::new();
        sales.set_fail_inserts(true);

        let sale = Sale {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            items: vec![],
            total_cents: 0,
            created_at: Utc::now(),
        };
        assert!(matches!(
            sales.insert(&sale).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(sales.is_empty());

        sales.set_fail_inserts(false);
        sales.insert(&sale).await.unwrap();
        assert!(matches!(
            sales.insert(&sale).await,
            Err(StoreError::Duplicate { .. })
        ));
    }
}
