//! # shelf-core: Sale Engine and Stock Consistency for Shelf
//!
//! This crate holds the parts of the storefront that have real invariants:
//! no overselling, no double decrement, no sale without its stock movement.
//! It performs no I/O; storage is reached through the traits in [`ledger`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shelf-api (axum REST routes)                    │   │
//! │  │    POST /api/sales        GET /api/dashboard/stats              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐ │   │
//! │  │   │  recorder  │  │   ledger   │  │ aggregate  │  │validation│ │   │
//! │  │   │SaleRecorder│─►│  traits    │◄─│ Aggregation│  │  rules   │ │   │
//! │  │   └────────────┘  └─────┬──────┘  │   Engine   │  └──────────┘ │   │
//! │  │                         │         └────────────┘               │   │
//! │  └─────────────────────────┼───────────────────────────────────────┘   │
//! │                            │ implemented by                             │
//! │  ┌─────────────────────────▼───────────────────────────────────────┐   │
//! │  │   shelf-db (SQLite)            memory (in-process, this crate)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, SaleProposal, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`ledger`] - Inventory ledger and store traits
//! - [`recorder`] - The Sale Recorder
//! - [`aggregate`] - Inventory valuation and revenue rollups
//! - [`memory`] - In-process catalog and sale store
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use shelf_core::memory::{InMemoryCatalog, InMemorySales};
//! use shelf_core::recorder::SaleRecorder;
//! use shelf_core::{ProposedLine, SaleProposal};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let catalog = Arc::new(InMemoryCatalog::new());
//! let pen = catalog.add_product("PEN-BLUE", "Blue Pen", 5, 2500);
//! let sales = Arc::new(InMemorySales::new());
//!
//! let recorder = SaleRecorder::new(catalog.clone(), sales.clone(), catalog.clone());
//! let sale = recorder
//!     .record_sale(SaleProposal::new("cust-1", vec![ProposedLine::new(&pen.id, 3)]))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(sale.total_cents, 7500);
//! assert_eq!(catalog.quantity_of(&pen.id), Some(2));
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod money;
pub mod recorder;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, LedgerError, StoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway proposals and keeps one batch decrement short.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum quantity on hand for one catalog product.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Maximum unit price in minor units (1,000,000.00).
///
/// ## Business Reason
/// Together with [`MAX_STOCK_QUANTITY`] this keeps one product's stock
/// value around 10^14, far inside `i64`, so catalog valuation stays exact.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Products at or below this quantity show up as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Products expiring within this many days show up as expiring soon.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Trailing window used for the dashboard's "monthly" revenue series.
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;
