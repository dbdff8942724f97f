//! # Ledger and Store Traits
//!
//! The seams between the sale engine and storage.
//!
//! ## Who Implements What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait             Used by               Implemented by                 │
//! │  ───────────────   ───────────────────   ─────────────────────────────  │
//! │  InventoryLedger   SaleRecorder          SqliteLedger, InMemoryCatalog  │
//! │  SaleStore         SaleRecorder, API     SaleRepository, InMemorySales  │
//! │  CatalogReader     Recorder, Aggregation ProductRepository,             │
//! │                                          InMemoryCatalog                │
//! │  SalesReader       AggregationEngine     SaleRepository, InMemorySales  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batch Decrement Contract
//! ```text
//! decrement_batch([(B, 2), (A, 1), (B, 1)])
//!      │
//!      ▼
//! consolidate → [(A, 1), (B, 3)]     merged, ascending product id
//!      │
//!      ▼
//! every product covers its quantity?
//!      ├── no  → InsufficientStock([...every short product...]), nothing applied
//!      └── yes → all applied together, never observable half-done
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::error::{LedgerError, StoreError};
use crate::money::Money;
use crate::types::{Availability, Product, Sale, SaleTotal, StockMovement};

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Authoritative quantity-on-hand, with guarded decrements.
///
/// Implementations guarantee that quantity never becomes negative and that
/// two concurrent batches touching the same product are serialized for that
/// product only.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Checks whether `requested` units are on hand right now.
    ///
    /// Advisory only: the answer can be stale by the time a decrement runs.
    async fn check_availability(
        &self,
        product_id: &str,
        requested: i64,
    ) -> Result<Availability, LedgerError>;

    /// Removes `quantity` units of one product.
    ///
    /// Fails with [`LedgerError::OutOfRange`] instead of going negative.
    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), LedgerError>;

    /// Removes every movement or none of them.
    async fn decrement_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError>;

    /// Puts stock back after a sale could not be persisted.
    async fn restock_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError>;
}

/// Merges movements per product and orders them by product id.
///
/// Every quantity must be positive and per-product sums must not overflow.
///
/// ```rust
/// use shelf_core::ledger::consolidate;
/// use shelf_core::StockMovement;
///
/// let merged = consolidate(&[
///     StockMovement::new("b", 2),
///     StockMovement::new("a", 1),
///     StockMovement::new("b", 1),
/// ])
/// .unwrap();
///
/// assert_eq!(merged, vec![StockMovement::new("a", 1), StockMovement::new("b", 3)]);
/// ```
pub fn consolidate(movements: &[StockMovement]) -> Result<Vec<StockMovement>, LedgerError> {
    let mut merged: BTreeMap<&str, i64> = BTreeMap::new();

    for movement in movements {
        if movement.quantity <= 0 {
            return Err(LedgerError::InvalidQuantity {
                product_id: movement.product_id.clone(),
                quantity: movement.quantity,
            });
        }

        let entry = merged.entry(movement.product_id.as_str()).or_insert(0);
        *entry = entry
            .checked_add(movement.quantity)
            .ok_or_else(|| LedgerError::InvalidQuantity {
                product_id: movement.product_id.clone(),
                quantity: i64::MAX,
            })?;
    }

    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| StockMovement::new(product_id, quantity))
        .collect())
}

// =============================================================================
// Sale Store
// =============================================================================

/// Append-only storage of committed sales.
///
/// There is intentionally no update or delete.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persists a sale together with its lines.
    async fn insert(&self, sale: &Sale) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Sale>, StoreError>;

    /// Newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<Sale>, StoreError>;
}

// =============================================================================
// Read Models
// =============================================================================

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Σ quantity × price over the catalog.
    ///
    /// Stores with a query engine should push this down.
    async fn inventory_value(&self) -> Result<Money, StoreError> {
        let products = self.list_products().await?;
        Ok(aggregate::inventory_value(&products))
    }
}

/// Read access to sale totals for revenue rollups.
#[async_trait]
pub trait SalesReader: Send + Sync {
    /// Sales with `from <= created_at` and, when given, `created_at < to`.
    async fn sale_totals_between(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SaleTotal>, StoreError>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidate_merges_and_sorts() {
        let merged = consolidate(&[
            StockMovement::new("p2", 4),
            StockMovement::new("p1", 1),
            StockMovement::new("p2", 1),
            StockMovement::new("p3", 7),
        ])
        .unwrap();

        assert_eq!(
            merged,
            vec![
                StockMovement::new("p1", 1),
                StockMovement::new("p2", 5),
                StockMovement::new("p3", 7),
            ]
        );
    }

    #[test]
    fn test_consolidate_rejects_non_positive() {
        let err = consolidate(&[StockMovement::new("p1", 0)]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity { quantity: 0, .. }));
    }

    #[test]
    fn test_consolidate_rejects_overflow() {
        let err = consolidate(&[
            StockMovement::new("p1", i64::MAX),
            StockMovement::new("p1", 1),
        ])
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_consolidate_empty() {
        assert!(consolidate(&[]).unwrap().is_empty());
    }
}
