//! # Aggregation
//!
//! Inventory valuation and revenue rollups for the dashboard.
//!
//! Everything here is recomputed per query from the catalog and the sale
//! store; nothing is cached. The free functions are pure and operate on
//! already-fetched rows. [`AggregationEngine`] wires them to storage.
//!
//! ## Day Boundaries
//! ```text
//! Reference zone: fixed UTC offset (e.g. +05:30)
//!
//!   local 2026-03-01 23:59:59  ──►  bucket 2026-03-01
//!   local 2026-03-02 00:00:00  ──►  bucket 2026-03-02   (midnight = later day)
//!
//! daily_revenue(as_of)      = Σ totals in [midnight(as_of), midnight(as_of) + 1 day)
//! revenue_series(n, now)    = Σ totals per local date, created_at ≥ midnight(today - n)
//!                             ascending, sparse (days without sales are absent)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::error::CoreResult;
use crate::ledger::{CatalogReader, SalesReader};
use crate::money::Money;
use crate::types::{DashboardStats, Product, RevenuePoint, SaleTotal, StockAlerts};
use crate::DASHBOARD_WINDOW_DAYS;

// =============================================================================
// Calendar Helpers
// =============================================================================

/// Calendar date of `ts` in the reference zone.
pub fn local_date(ts: DateTime<Utc>, zone: FixedOffset) -> NaiveDate {
    ts.with_timezone(&zone).date_naive()
}

/// Instant of local midnight starting `date`.
pub fn local_midnight(date: NaiveDate, zone: FixedOffset) -> DateTime<Utc> {
    let offset = Duration::seconds(i64::from(zone.local_minus_utc()));
    date.and_time(NaiveTime::MIN)
        .checked_sub_signed(offset)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Half-open `[start, end)` covering one local calendar date.
pub fn day_bounds(date: NaiveDate, zone: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date, zone);
    let end = start
        .checked_add_signed(Duration::days(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// Start of a trailing window: local midnight of `window_days` days before today.
pub fn window_start(now: DateTime<Utc>, window_days: i64, zone: FixedOffset) -> DateTime<Utc> {
    let today = local_date(now, zone);
    let first_day = u64::try_from(window_days)
        .ok()
        .and_then(|days| today.checked_sub_days(Days::new(days)))
        .unwrap_or(NaiveDate::MIN);
    local_midnight(first_day, zone)
}

// =============================================================================
// Revenue
// =============================================================================

/// Σ totals of sales falling on `date` in the reference zone.
pub fn revenue_on(sales: &[SaleTotal], date: NaiveDate, zone: FixedOffset) -> Money {
    let (start, end) = day_bounds(date, zone);
    sales
        .iter()
        .filter(|sale| sale.created_at >= start && sale.created_at < end)
        .fold(Money::zero(), |acc, sale| acc.saturating_add(sale.total))
}

/// Groups sale totals by local date, ascending, omitting empty days.
///
/// ```rust
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use shelf_core::aggregate::bucket_by_day;
/// use shelf_core::{Money, SaleTotal};
///
/// let utc = FixedOffset::east_opt(0).unwrap();
/// let sales = vec![
///     SaleTotal { created_at: Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap(), total: Money::from_cents(500) },
///     SaleTotal { created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(), total: Money::from_cents(300) },
///     SaleTotal { created_at: Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap(), total: Money::from_cents(200) },
/// ];
///
/// let series = bucket_by_day(&sales, utc);
/// assert_eq!(series.len(), 2);
/// assert_eq!(series[0].date.to_string(), "2026-03-01");
/// assert_eq!(series[0].sales.cents(), 500);
/// ```
pub fn bucket_by_day(sales: &[SaleTotal], zone: FixedOffset) -> Vec<RevenuePoint> {
    let mut buckets: BTreeMap<NaiveDate, Money> = BTreeMap::new();

    for sale in sales {
        let bucket = buckets
            .entry(local_date(sale.created_at, zone))
            .or_insert_with(Money::zero);
        *bucket = bucket.saturating_add(sale.total);
    }

    buckets
        .into_iter()
        .map(|(date, sales)| RevenuePoint { date, sales })
        .collect()
}

// =============================================================================
// Catalog Rollups
// =============================================================================

/// Σ quantity × price. Zero for an empty catalog.
pub fn inventory_value(products: &[Product]) -> Money {
    products
        .iter()
        .fold(Money::zero(), |acc, p| acc.saturating_add(p.stock_value()))
}

/// Products with quantity at or below `threshold`, lowest first.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<Product> {
    let mut low: Vec<Product> = products
        .iter()
        .filter(|p| p.is_low_stock(threshold))
        .cloned()
        .collect();
    low.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
    low
}

/// Products whose expiry date is before `today + within_days`, soonest first.
///
/// Already-expired products are included.
pub fn expiring_soon(products: &[Product], today: NaiveDate, within_days: i64) -> Vec<Product> {
    let cutoff = u64::try_from(within_days)
        .ok()
        .and_then(|days| today.checked_add_days(Days::new(days)))
        .unwrap_or(today);

    let mut expiring: Vec<Product> = products
        .iter()
        .filter(|p| p.expires_before(cutoff))
        .cloned()
        .collect();
    expiring.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));
    expiring
}

// =============================================================================
// Aggregation Engine
// =============================================================================

/// Computes dashboard figures from the catalog and the sale store.
///
/// Read-only. A figure may reflect a snapshot that is slightly behind a
/// sale committing concurrently.
pub struct AggregationEngine {
    catalog: Arc<dyn CatalogReader>,
    sales: Arc<dyn SalesReader>,
    zone: FixedOffset,
}

impl AggregationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        sales: Arc<dyn SalesReader>,
        zone: FixedOffset,
    ) -> Self {
        Self {
            catalog,
            sales,
            zone,
        }
    }

    /// The reference zone used for day boundaries.
    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    pub async fn total_inventory_value(&self) -> CoreResult<Money> {
        Ok(self.catalog.inventory_value().await?)
    }

    /// Revenue for the local calendar date containing `as_of`.
    pub async fn daily_revenue(&self, as_of: DateTime<Utc>) -> CoreResult<Money> {
        let date = local_date(as_of, self.zone);
        let (start, end) = day_bounds(date, self.zone);
        let sales = self.sales.sale_totals_between(start, Some(end)).await?;
        Ok(revenue_on(&sales, date, self.zone))
    }

    /// Per-day revenue over the trailing `window_days`.
    ///
    /// A non-positive window yields an empty series.
    pub async fn revenue_series(
        &self,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<RevenuePoint>> {
        if window_days <= 0 {
            return Ok(Vec::new());
        }

        let from = window_start(now, window_days, self.zone);
        let sales = self.sales.sale_totals_between(from, None).await?;
        debug!(window_days, %from, sales = sales.len(), "Bucketing revenue");
        Ok(bucket_by_day(&sales, self.zone))
    }

    /// Everything `GET /api/dashboard/stats` returns.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> CoreResult<DashboardStats> {
        Ok(DashboardStats {
            total_inventory_value: self.total_inventory_value().await?,
            daily_sales: self.daily_revenue(now).await?,
            monthly_sales: self.revenue_series(DASHBOARD_WINDOW_DAYS, now).await?,
        })
    }

    pub async fn low_stock(&self, threshold: i64) -> CoreResult<Vec<Product>> {
        let products = self.catalog.list_products().await?;
        Ok(low_stock(&products, threshold))
    }

    pub async fn expiring_soon(
        &self,
        within_days: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Product>> {
        let products = self.catalog.list_products().await?;
        Ok(expiring_soon(
            &products,
            local_date(now, self.zone),
            within_days,
        ))
    }

    /// Low-stock and expiring products from a single catalog read.
    pub async fn alerts(
        &self,
        threshold: i64,
        within_days: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<StockAlerts> {
        let products = self.catalog.list_products().await?;
        Ok(StockAlerts {
            low_stock: low_stock(&products, threshold),
            expiring_soon: expiring_soon(&products, local_date(now, self.zone), within_days),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryCatalog, InMemorySales};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(ts: DateTime<Utc>, cents: i64) -> SaleTotal {
        SaleTotal {
            created_at: ts,
            total: Money::from_cents(cents),
        }
    }

    fn product(name: &str, quantity: i64, price_cents: i64, expiry: Option<NaiveDate>) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            category: "General".to_string(),
            sku: name.to_uppercase(),
            quantity,
            price_cents,
            expiry_date: expiry,
            description: String::new(),
            created_at: at(2026, 1, 1, 0, 0, 0),
            updated_at: at(2026, 1, 1, 0, 0, 0),
        }
    }

    #[test]
    fn test_inventory_value() {
        let products = vec![
            product("Pen", 25, 2500, None),
            product("Ink", 15, 3500, None),
        ];
        assert_eq!(inventory_value(&products).cents(), 115000);
        assert_eq!(inventory_value(&[]), Money::zero());
    }

    #[test]
    fn test_midnight_belongs_to_later_day() {
        let sales = vec![
            sale(at(2026, 3, 1, 23, 59, 59), 100),
            sale(at(2026, 3, 2, 0, 0, 0), 200),
        ];

        assert_eq!(revenue_on(&sales, date(2026, 3, 1), utc()).cents(), 100);
        assert_eq!(revenue_on(&sales, date(2026, 3, 2), utc()).cents(), 200);

        let series = bucket_by_day(&sales, utc());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date(2026, 3, 1));
        assert_eq!(series[1].date, date(2026, 3, 2));
    }

    #[test]
    fn test_day_bounds_respect_offset() {
        // Local midnight at +05:30 is 18:30 UTC the previous day.
        let (start, end) = day_bounds(date(2026, 3, 2), ist());
        assert_eq!(start, at(2026, 3, 1, 18, 30, 0));
        assert_eq!(end, at(2026, 3, 2, 18, 30, 0));

        assert_eq!(local_date(at(2026, 3, 1, 18, 29, 59), ist()), date(2026, 3, 1));
        assert_eq!(local_date(at(2026, 3, 1, 18, 30, 0), ist()), date(2026, 3, 2));
    }

    #[test]
    fn test_window_start() {
        let now = at(2026, 3, 31, 15, 0, 0);
        assert_eq!(window_start(now, 30, utc()), at(2026, 3, 1, 0, 0, 0));
        assert_eq!(window_start(now, 0, utc()), at(2026, 3, 31, 0, 0, 0));
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let products = vec![
            product("A", 11, 100, None),
            product("B", 10, 100, None),
            product("C", 0, 100, None),
        ];
        let low = low_stock(&products, 10);
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B"]);
    }

    #[test]
    fn test_expiring_soon() {
        let today = date(2026, 3, 1);
        let products = vec![
            product("Later", 1, 100, Some(date(2026, 4, 1))),
            product("Soon", 1, 100, Some(date(2026, 3, 20))),
            product("Expired", 1, 100, Some(date(2026, 2, 1))),
            product("Never", 1, 100, None),
        ];
        let expiring = expiring_soon(&products, today, 30);
        let names: Vec<&str> = expiring.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Expired", "Soon"]);
    }

    // =========================================================================
    // Engine
    // =========================================================================

    async fn engine_with_sales(sales: &[(DateTime<Utc>, i64)]) -> AggregationEngine {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.add_product("PEN", "Pen", 25, 2500);
        catalog.add_product("INK", "Ink", 15, 3500);

        let store = Arc::new(InMemorySales::new());
        for (ts, cents) in sales {
            store.push_total(*ts, *cents);
        }

        AggregationEngine::new(catalog, store, utc())
    }

    #[tokio::test]
    async fn test_sparse_series_over_window() {
        let now = at(2026, 3, 5, 12, 0, 0);
        let engine = engine_with_sales(&[
            (at(2026, 3, 1, 10, 0, 0), 400),
            (at(2026, 3, 3, 10, 0, 0), 600),
        ])
        .await;

        let series = engine.revenue_series(5, now).await.unwrap();
        assert_eq!(
            series,
            vec![
                RevenuePoint {
                    date: date(2026, 3, 1),
                    sales: Money::from_cents(400),
                },
                RevenuePoint {
                    date: date(2026, 3, 3),
                    sales: Money::from_cents(600),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_series_excludes_sales_before_window() {
        let now = at(2026, 3, 31, 12, 0, 0);
        let engine = engine_with_sales(&[
            (at(2026, 2, 28, 23, 59, 59), 999),
            (at(2026, 3, 1, 0, 0, 0), 100),
        ])
        .await;

        let series = engine.revenue_series(30, now).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, date(2026, 3, 1));
    }

    #[tokio::test]
    async fn test_non_positive_window_is_empty() {
        let now = at(2026, 3, 5, 12, 0, 0);
        let engine = engine_with_sales(&[(now, 100)]).await;

        assert!(engine.revenue_series(0, now).await.unwrap().is_empty());
        assert!(engine.revenue_series(-3, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard() {
        let now = at(2026, 3, 5, 12, 0, 0);
        let engine = engine_with_sales(&[
            (at(2026, 3, 4, 23, 59, 59), 300),
            (at(2026, 3, 5, 0, 0, 0), 700),
            (at(2026, 3, 5, 11, 0, 0), 500),
        ])
        .await;

        let stats = engine.dashboard(now).await.unwrap();
        assert_eq!(stats.total_inventory_value.cents(), 115000);
        assert_eq!(stats.daily_sales.cents(), 1200);
        assert_eq!(stats.monthly_sales.len(), 2);
        assert_eq!(stats.monthly_sales[1].sales.cents(), 1200);
    }

    #[tokio::test]
    async fn test_daily_revenue_zero_without_sales() {
        let engine = engine_with_sales(&[]).await;
        let revenue = engine.daily_revenue(at(2026, 3, 5, 12, 0, 0)).await.unwrap();
        assert!(revenue.is_zero());
    }
}
