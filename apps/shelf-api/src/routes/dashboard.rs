//! Dashboard routes. Both read the catalog and sale log; nothing is cached.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shelf_core::{DashboardStats, StockAlerts};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Optional overrides for `GET /api/dashboard/alerts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsQuery {
    pub threshold: Option<i64>,
    pub days: Option<i64>,
}

/// `GET /api/dashboard/stats`
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.engine.dashboard(Utc::now()).await?))
}

/// `GET /api/dashboard/alerts`
pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> ApiResult<Json<StockAlerts>> {
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let days = query.days.unwrap_or(state.config.expiry_window_days);

    if threshold < 0 || days < 0 {
        return Err(ApiError::BadRequest(
            "threshold and days must not be negative".to_string(),
        ));
    }

    Ok(Json(state.engine.alerts(threshold, days, Utc::now()).await?))
}
