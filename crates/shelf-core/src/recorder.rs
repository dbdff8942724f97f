//! # Sale Recorder
//!
//! Turns a validated [`SaleProposal`] into an immutable [`Sale`] while
//! keeping stock consistent.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(proposal)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. validate_proposal ──────────────────────► Validation error          │
//! │       │                                       (nothing touched)         │
//! │       ▼                                                                 │
//! │  2. price lines (catalog price when the client sent none)              │
//! │     compute_total, check_declared_total ────► Validation error          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. ledger.decrement_batch ─────────────────► InsufficientStock /       │
//! │       │                                       ProductNotFound           │
//! │       │                                       (nothing touched)         │
//! │       ▼                                                                 │
//! │  4. sales.insert(sale) ──── ok ─────────────► Sale                      │
//! │       │                                                                 │
//! │       └── failed                                                        │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  5. ledger.restock_batch (compensation)                                 │
//! │     error! ─────────────────────────────────► PartialCommitDetected     │
//! │                                                                         │
//! │  A Sale exists if and only if its decrements were applied.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::ledger::{CatalogReader, InventoryLedger, SaleStore};
use crate::types::{Sale, SaleLine, SaleProposal, StockMovement};
use crate::validation::{check_declared_total, compute_total, validate_proposal};

/// Records sales against an inventory ledger.
///
/// Cheap to share behind an `Arc`; holds no per-sale state.
pub struct SaleRecorder {
    ledger: Arc<dyn InventoryLedger>,
    sales: Arc<dyn SaleStore>,
    catalog: Arc<dyn CatalogReader>,
}

impl SaleRecorder {
    pub fn new(
        ledger: Arc<dyn InventoryLedger>,
        sales: Arc<dyn SaleStore>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            ledger,
            sales,
            catalog,
        }
    }

    /// Validates, decrements stock and persists one sale.
    ///
    /// ## Errors
    /// - [`CoreError::Validation`]: malformed proposal or total mismatch
    /// - [`CoreError::ProductNotFound`]: a line names an unknown product
    /// - [`CoreError::InsufficientStock`]: lists every short product
    /// - [`CoreError::Persistence`]: storage unavailable before anything changed
    /// - [`CoreError::PartialCommitDetected`]: stock was decremented but the
    ///   sale could not be stored; compensation has been attempted
    #[instrument(
        skip(self, proposal),
        fields(customer = %proposal.customer_id, lines = proposal.items.len())
    )]
    pub async fn record_sale(&self, proposal: SaleProposal) -> CoreResult<Sale> {
        validate_proposal(&proposal)?;

        let lines = self.price_lines(&proposal).await?;
        let total = compute_total(&lines)?;
        check_declared_total(proposal.declared_total_cents, total)?;

        let movements: Vec<StockMovement> = lines
            .iter()
            .map(|line| StockMovement::new(&line.product_id, line.quantity))
            .collect();

        if let Err(err) = self.ledger.decrement_batch(&movements).await {
            warn!(error = %err, "Sale rejected by inventory ledger");
            return Err(err.into());
        }

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: proposal.customer_id.trim().to_string(),
            items: lines,
            total_cents: total.cents(),
            created_at: Utc::now(),
        };

        match self.sales.insert(&sale).await {
            Ok(()) => {
                info!(sale_id = %sale.id, total = %total, "Sale recorded");
                Ok(sale)
            }
            Err(store_err) => {
                let restored = match self.ledger.restock_batch(&movements).await {
                    Ok(()) => true,
                    Err(restock_err) => {
                        error!(
                            sale_id = %sale.id,
                            error = %restock_err,
                            "Compensating restock failed; stock remains decremented"
                        );
                        false
                    }
                };

                error!(
                    sale_id = %sale.id,
                    restored,
                    error = %store_err,
                    "Sale insert failed after stock decrement"
                );

                Err(CoreError::PartialCommitDetected {
                    sale_id: sale.id,
                    restored,
                    reason: store_err.to_string(),
                })
            }
        }
    }

    /// Snapshots a unit price onto every line.
    async fn price_lines(&self, proposal: &SaleProposal) -> CoreResult<Vec<SaleLine>> {
        let mut lines = Vec::with_capacity(proposal.items.len());

        for item in &proposal.items {
            let product_id = item.product_id.trim();
            let unit_price_cents = match item.unit_price_cents {
                Some(price) => price,
                None => {
                    let product = self
                        .catalog
                        .get_product(product_id)
                        .await?
                        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
                    debug!(product_id = %product.id, price = product.price_cents, "Using catalog price");
                    product.price_cents
                }
            };

            lines.push(SaleLine {
                product_id: product_id.to_string(),
                quantity: item.quantity,
                unit_price_cents,
            });
        }

        Ok(lines)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
