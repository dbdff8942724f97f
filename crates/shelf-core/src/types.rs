//! # Domain Types
//!
//! Core domain types used throughout Shelf.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  SaleProposal   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  customer_id    │       │
//! │  │  sku (unique)   │   │  customer_id    │   │  items          │       │
//! │  │  quantity ≥ 0   │   │  items (frozen) │   │  declared total │       │
//! │  │  price_cents    │   │  total_cents    │   └────────┬────────┘       │
//! │  └─────────────────┘   └─────────────────┘            │ record_sale    │
//! │                               ▲                       │                │
//! │                               └───────────────────────┘                │
//! │                                                                         │
//! │  Derived, never stored: DashboardStats, RevenuePoint, StockAlerts       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleLine` freezes the unit price at proposal time, so historical
//! totals stay stable when catalog prices change later.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-text category tag ("Dairy", "Stationery").
    pub category: String,

    /// Stock Keeping Unit. Unique, immutable once assigned.
    pub sku: String,

    /// Quantity on hand. Never negative.
    pub quantity: i64,

    /// Unit price in minor units.
    pub price_cents: i64,

    /// Optional expiry date for perishables.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    #[serde(default)]
    pub description: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Quantity × price, clamped rather than overflowing.
    pub fn stock_value(&self) -> Money {
        Money::from_cents(self.quantity.saturating_mul(self.price_cents))
    }

    /// Checks if the current quantity covers `requested`.
    #[inline]
    pub fn can_sell(&self, requested: i64) -> bool {
        self.quantity >= requested
    }

    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    /// Checks if the product expires strictly before `date`.
    pub fn expires_before(&self, date: NaiveDate) -> bool {
        self.expiry_date.map_or(false, |expiry| expiry < date)
    }
}

/// Create/update payload for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub sku: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer. Referenced by sales, never required to exist for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// One committed line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    /// Quantity sold (always positive).
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
}

impl SaleLine {
    /// quantity × unit price, `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul_quantity(self.quantity)
    }
}

/// An immutable, committed sale.
///
/// Created exactly once by the Sale Recorder. There is no update or delete
/// path anywhere in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Weak reference; the customer is not required to exist.
    pub customer_id: String,
    pub items: Vec<SaleLine>,
    /// Always equal to Σ quantity × unit price of `items`.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Recomputes Σ line totals, `None` on overflow.
    pub fn computed_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()?))
    }
}

/// A line item as proposed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedLine {
    pub product_id: String,
    pub quantity: i64,
    /// Client-side price. When absent the catalog price is captured.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl ProposedLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        ProposedLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
        }
    }

    pub fn with_price(mut self, unit_price_cents: i64) -> Self {
        self.unit_price_cents = Some(unit_price_cents);
        self
    }
}

/// A proposed sale, validated before it touches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleProposal {
    pub customer_id: String,
    pub items: Vec<ProposedLine>,
    /// Total the client computed, if it sent one. Must match exactly.
    #[serde(default)]
    pub declared_total_cents: Option<i64>,
}

impl SaleProposal {
    pub fn new(customer_id: impl Into<String>, items: Vec<ProposedLine>) -> Self {
        SaleProposal {
            customer_id: customer_id.into(),
            items,
            declared_total_cents: None,
        }
    }

    pub fn with_declared_total(mut self, total_cents: i64) -> Self {
        self.declared_total_cents = Some(total_cents);
        self
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// A (product, quantity) pair handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: String,
    pub quantity: i64,
}

impl StockMovement {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        StockMovement {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Identifies a product that could not cover a requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: String,
    pub sku: String,
    pub available: i64,
    pub requested: i64,
}

impl fmt::Display for StockShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: available {}, requested {}",
            self.sku, self.available, self.requested
        )
    }
}

/// Result of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Insufficient { current: i64, requested: i64 },
}

// =============================================================================
// Aggregates
// =============================================================================

/// The (timestamp, total) projection of a sale the aggregation engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotal {
    pub created_at: DateTime<Utc>,
    pub total: Money,
}

/// Revenue for one calendar date of the reference zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenuePoint {
    /// Serialized as `YYYY-MM-DD`.
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sales: Money,
}

/// Body of `GET /api/dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_inventory_value: Money,
    pub daily_sales: Money,
    /// Trailing 30-day window, sparse, ascending by date.
    pub monthly_sales: Vec<RevenuePoint>,
}

/// Products needing attention on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAlerts {
    pub low_stock: Vec<Product>,
    pub expiring_soon: Vec<Product>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "Milk".to_string(),
            category: "Dairy".to_string(),
            sku: "MILK-1L".to_string(),
            quantity,
            price_cents,
            expiry_date: NaiveDate::from_ymd_opt(2026, 3, 10),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_stock_checks() {
        let p = product(5, 2500);
        assert!(p.can_sell(5));
        assert!(!p.can_sell(6));
        assert!(p.is_low_stock(10));
        assert_eq!(p.stock_value().cents(), 12500);
    }

    #[test]
    fn test_expires_before() {
        let p = product(1, 100);
        assert!(p.expires_before(NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()));
        assert!(!p.expires_before(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()));

        let no_expiry = Product {
            expiry_date: None,
            ..product(1, 100)
        };
        assert!(!no_expiry.expires_before(NaiveDate::MAX));
    }

    #[test]
    fn test_sale_computed_total() {
        let sale = Sale {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            items: vec![
                SaleLine {
                    product_id: "a".to_string(),
                    quantity: 2,
                    unit_price_cents: 2500,
                },
                SaleLine {
                    product_id: "b".to_string(),
                    quantity: 1,
                    unit_price_cents: 3500,
                },
            ],
            total_cents: 8500,
            created_at: Utc::now(),
        };
        assert_eq!(sale.computed_total(), Some(sale.total()));
    }

    #[test]
    fn test_revenue_point_serializes_date_as_iso() {
        let point = RevenuePoint {
            date: NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
            sales: Money::from_cents(1200),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2026-10-03");
        assert_eq!(json["sales"], 1200);
    }

    #[test]
    fn test_dashboard_stats_field_names() {
        let stats = DashboardStats {
            total_inventory_value: Money::from_cents(115000),
            daily_sales: Money::zero(),
            monthly_sales: vec![],
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalInventoryValue"], 115000);
        assert_eq!(json["dailySales"], 0);
        assert!(json["monthlySales"].as_array().unwrap().is_empty());
    }
}
