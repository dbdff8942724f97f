//! # Sales Routes
//!
//! ```text
//! POST /api/sales        record a sale (201 | 400 | 503 | 500)
//! GET  /api/sales        most recent first, ?limit= (default 50)
//! GET  /api/sales/:id    one sale with its lines
//! ```
//!
//! The request body keeps the storefront's field names; it is translated
//! into a [`SaleProposal`] before it reaches the recorder.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shelf_core::{ProposedLine, Sale, SaleProposal};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// One line as the storefront sends it.
#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub product: String,
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<i64>,
}

/// Body of `POST /api/sales`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub customer: String,
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub total_amount: Option<i64>,
}

impl From<CreateSaleRequest> for SaleProposal {
    fn from(req: CreateSaleRequest) -> Self {
        SaleProposal {
            customer_id: req.customer,
            items: req
                .items
                .into_iter()
                .map(|item| ProposedLine {
                    product_id: item.product,
                    quantity: item.quantity,
                    unit_price_cents: item.price,
                })
                .collect(),
            declared_total_cents: req.total_amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleCreated {
    pub message: &'static str,
    pub sale: Sale,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleCreated>)> {
    let Json(request) = payload?;
    let sale = state.recorder.record_sale(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaleCreated {
            message: "Sale recorded successfully",
            sale,
        }),
    ))
}

pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.db.sales().list_recent(limit).await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", id))
}
