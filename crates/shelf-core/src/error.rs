//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── ValidationError  - Malformed proposal, rejected before the ledger │
//! │  ├── LedgerError      - Stock checks and decrements                    │
//! │  ├── StoreError       - Sale store / catalog reader failures           │
//! │  └── CoreError        - What record_sale and the stats engine return   │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  └── DbError          - sqlx failures, mapped into Ledger/StoreError   │
//! │                                                                         │
//! │  shelf-api errors (in app)                                             │
//! │  └── ApiError         - status code + {message} body                   │
//! │                                                                         │
//! │  Flow: ValidationError / LedgerError / StoreError → CoreError → ApiError│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::StockShortfall;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by the Sale Recorder and the Aggregation Engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Proposal rejected before the ledger was touched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A line references a product the catalog does not know.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// One or more products cannot cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /api/sales  { PEN-BLUE × 4 }
    ///      │
    ///      ▼
    /// decrement_batch: available=2
    ///      │
    ///      ▼
    /// InsufficientStock([PEN-BLUE: available 2, requested 4])
    ///      │
    ///      ▼
    /// 400 {"message": "Insufficient stock for PEN-BLUE: available 2, requested 4"}
    /// ```
    /// Nothing was changed; the client may adjust quantities and resubmit.
    #[error("Insufficient stock for {}", join_shortfalls(.0))]
    InsufficientStock(Vec<StockShortfall>),

    /// Storage was unavailable. No partial effect, safe to retry.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Stock was decremented but the sale record could not be written.
    ///
    /// The recorder re-increments the stock before returning this;
    /// `restored` tells whether that compensation went through.
    #[error("Sale {sale_id} was not persisted after stock was decremented (stock restored: {restored}): {reason}")]
    PartialCommitDetected {
        sale_id: String,
        restored: bool,
        reason: String,
    },
}

impl CoreError {
    /// Whether the caller can resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Persistence(_) | CoreError::PartialCommitDetected { restored: true, .. }
        )
    }
}

fn join_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The client's total disagrees with Σ quantity × price.
    #[error("totalAmount {declared} does not match the sum of line items {computed}")]
    TotalMismatch { declared: Money, computed: Money },

    /// Σ quantity × price does not fit in the money type.
    #[error("sale total overflows")]
    TotalOverflow,

    /// Field cannot change once assigned.
    #[error("{field} cannot be changed once assigned")]
    Immutable { field: String },
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Errors from an [`InventoryLedger`](crate::ledger::InventoryLedger).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A single decrement would take quantity below zero.
    #[error("Decrement out of range for {0}")]
    OutOfRange(StockShortfall),

    /// A batch decrement was refused; every short product is listed.
    #[error("Insufficient stock for {}", join_shortfalls(.0))]
    InsufficientStock(Vec<StockShortfall>),

    /// Movements must carry a positive quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// The backing store failed; nothing was applied.
    #[error("Ledger storage failure: {0}")]
    Storage(String),
}

impl From<LedgerError> for CoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProductNotFound(id) => CoreError::ProductNotFound(id),
            LedgerError::OutOfRange(shortfall) => CoreError::InsufficientStock(vec![shortfall]),
            LedgerError::InsufficientStock(shortfalls) => CoreError::InsufficientStock(shortfalls),
            LedgerError::InvalidQuantity { quantity, .. } if quantity <= 0 => {
                CoreError::Validation(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                })
            }
            LedgerError::InvalidQuantity { .. } => {
                CoreError::Validation(ValidationError::TotalOverflow)
            }
            LedgerError::Storage(msg) => CoreError::Persistence(msg),
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors from sale stores and catalog readers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {field}: '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Storage unavailable or query failed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Persistence(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
