//! Catalog CRUD. SKUs are unique and cannot change after creation.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shelf_core::validation::{ensure_sku_unchanged, validate_product_draft};
use shelf_core::{Product, ProductDraft};

use super::Deleted;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(draft) = payload?;
    validate_product_draft(&draft)?;

    let product = state.db.products().create(&draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(draft) = payload?;

    let current = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    ensure_sku_unchanged(&current.sku, &draft.sku)?;
    validate_product_draft(&draft)?;

    Ok(Json(state.db.products().update(&id, &draft).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    state.db.products().delete(&id).await?;
    Ok(Json(Deleted::new("Product deleted")))
}
