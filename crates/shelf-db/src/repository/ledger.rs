//! # SQLite Inventory Ledger
//!
//! Guarded stock movements over the `products` table.
//!
//! ## Check-and-Decrement in One Statement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ Read-then-write (two requests can both see quantity = 5)            │
//! │     SELECT quantity ...           → 5                                   │
//! │     UPDATE ... SET quantity = 2                                         │
//! │                                                                         │
//! │  ✅ Conditional delta                                                   │
//! │     UPDATE products SET quantity = quantity - ?2                        │
//! │     WHERE id = ?1 AND quantity >= ?2                                    │
//! │     rows_affected = 0  →  unknown product or not enough stock           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A batch runs every line inside one transaction, in ascending product id
//! order. Any short line rolls the whole transaction back. SQLite's write
//! lock serializes concurrent batches; waiting is bounded by the busy timeout.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::DbError;
use shelf_core::ledger::{consolidate, InventoryLedger};
use shelf_core::{Availability, LedgerError, StockMovement, StockShortfall};

fn storage(err: sqlx::Error) -> LedgerError {
    DbError::from(err).into()
}

/// Outcome of one guarded line inside a batch.
enum LineOutcome {
    Applied,
    Missing(String),
    Short(StockShortfall),
}

/// [`InventoryLedger`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedger { pool }
    }

    async fn decrement_line(
        tx: &mut Transaction<'_, Sqlite>,
        movement: &StockMovement,
    ) -> Result<LineOutcome, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 1 {
            return Ok(LineOutcome::Applied);
        }

        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT sku, quantity FROM products WHERE id = ?1")
                .bind(&movement.product_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(storage)?;

        Ok(match current {
            None => LineOutcome::Missing(movement.product_id.clone()),
            Some((sku, available)) => LineOutcome::Short(StockShortfall {
                product_id: movement.product_id.clone(),
                sku,
                available,
                requested: movement.quantity,
            }),
        })
    }

    /// Runs consolidated decrements in one transaction; commits only if all apply.
    async fn apply_decrements(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let mut missing = Vec::new();
        let mut shortfalls = Vec::new();

        for movement in movements {
            match Self::decrement_line(&mut tx, movement).await? {
                LineOutcome::Applied => {}
                LineOutcome::Missing(id) => missing.push(id),
                LineOutcome::Short(shortfall) => shortfalls.push(shortfall),
            }
        }

        if let Some(id) = missing.into_iter().next() {
            tx.rollback().await.map_err(storage)?;
            return Err(LedgerError::ProductNotFound(id));
        }

        if !shortfalls.is_empty() {
            tx.rollback().await.map_err(storage)?;
            warn!(short = shortfalls.len(), "Batch decrement refused");
            return Err(LedgerError::InsufficientStock(shortfalls));
        }

        tx.commit().await.map_err(storage)?;
        debug!(lines = movements.len(), "Batch decrement committed");
        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for SqliteLedger {
    async fn check_availability(
        &self,
        product_id: &str,
        requested: i64,
    ) -> Result<Availability, LedgerError> {
        let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        match current {
            None => Err(LedgerError::ProductNotFound(product_id.to_string())),
            Some(current) if current >= requested => Ok(Availability::Available),
            Some(current) => Ok(Availability::Insufficient { current, requested }),
        }
    }

    async fn decrement(&self, product_id: &str, quantity: i64) -> Result<(), LedgerError> {
        let movements = consolidate(&[StockMovement::new(product_id, quantity)])?;
        self.apply_decrements(&movements)
            .await
            .map_err(|err| match err {
                LedgerError::InsufficientStock(mut shortfalls) if shortfalls.len() == 1 => {
                    LedgerError::OutOfRange(shortfalls.remove(0))
                }
                other => other,
            })
    }

    async fn decrement_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let movements = consolidate(movements)?;
        self.apply_decrements(&movements).await
    }

    async fn restock_batch(&self, movements: &[StockMovement]) -> Result<(), LedgerError> {
        let movements = consolidate(movements)?;
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for movement in &movements {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity + ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&movement.product_id)
            .bind(movement.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

            if result.rows_affected() == 0 {
                tx.rollback().await.map_err(storage)?;
                return Err(LedgerError::ProductNotFound(movement.product_id.clone()));
            }
        }

        tx.commit().await.map_err(storage)?;
        debug!(lines = movements.len(), "Restock committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
