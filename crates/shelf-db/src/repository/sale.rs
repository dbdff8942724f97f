//! # Sale Repository
//!
//! The append-only sale log.
//!
//! ## Storage Layout
//! ```text
//! ┌───────────────────────────────┐      ┌──────────────────────────────────┐
//! │ sales                         │      │ sale_items                       │
//! │  id (PK)                      │ 1──N │  sale_id, line_no (PK)           │
//! │  customer_id  (weak ref)      │      │  product_id (weak ref)           │
//! │  total_cents                  │      │  quantity > 0                    │
//! │  created_at   (indexed)       │      │  unit_price_cents (frozen)       │
//! └───────────────────────────────┘      └──────────────────────────────────┘
//!
//! Both tables refuse UPDATE and DELETE via triggers.
//! ```
//!
//! A sale and its lines are written in one transaction, so readers never
//! see a header without its lines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use shelf_core::ledger::{SaleStore, SalesReader};
use shelf_core::{Money, Sale, SaleLine, SaleTotal, StoreError};

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    customer_id: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SaleLineRow {
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
}

#[derive(Debug, FromRow)]
struct SaleTotalRow {
    created_at: DateTime<Utc>,
    total_cents: i64,
}

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale and its lines atomically.
    pub async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(sale_id = %sale.id, lines = sale.items.len(), "Inserting sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, line_no, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(sale_id = %sale.id, total_cents = sale.total_cents, "Sale persisted");
        Ok(())
    }

    /// Gets a sale with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, customer_id, total_cents, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_items(row).await?)),
            None => Ok(None),
        }
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, customer_id, total_cents, created_at
            FROM sales
            ORDER BY created_at DESC, id
            LIMIT ?1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            sales.push(self.with_items(row).await?);
        }
        Ok(sales)
    }

    /// Gets the line items of a sale in their original order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let rows = sqlx::query_as::<_, SaleLineRow>(
            r#"
            SELECT product_id, quantity, unit_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SaleLine {
                product_id: r.product_id,
                quantity: r.quantity,
                unit_price_cents: r.unit_price_cents,
            })
            .collect())
    }

    /// `(created_at, total)` of sales in `[from, to)`; open-ended without `to`.
    pub async fn totals_between(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<SaleTotal>> {
        let rows = sqlx::query_as::<_, SaleTotalRow>(
            r#"
            SELECT created_at, total_cents
            FROM sales
            WHERE created_at >= ?1 AND (?2 IS NULL OR created_at < ?2)
            ORDER BY created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SaleTotal {
                created_at: r.created_at,
                total: Money::from_cents(r.total_cents),
            })
            .collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn with_items(&self, row: SaleRow) -> DbResult<Sale> {
        let items = self.get_items(&row.id).await?;
        Ok(Sale {
            id: row.id,
            customer_id: row.customer_id,
            items,
            total_cents: row.total_cents,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn insert(&self, sale: &Sale) -> Result<(), StoreError> {
        Ok(self.insert_sale(sale).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<Sale>, StoreError> {
        Ok(self.get_by_id(id).await?)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Sale>, StoreError> {
        Ok(self.list_recent(limit).await?)
    }
}

#[async_trait]
impl SalesReader for SaleRepository {
    async fn sale_totals_between(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SaleTotal>, StoreError> {
        Ok(self.totals_between(from, to).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
