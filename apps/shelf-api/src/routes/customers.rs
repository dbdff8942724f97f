//! Customer CRUD. Sales reference customers weakly, so deletes never cascade.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shelf_core::validation::validate_customer_draft;
use shelf_core::{Customer, CustomerDraft};

use super::Deleted;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let Json(draft) = payload?;
    validate_customer_draft(&draft)?;

    let customer = state.db.customers().create(&draft).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> ApiResult<Json<Customer>> {
    let Json(draft) = payload?;
    validate_customer_draft(&draft)?;

    Ok(Json(state.db.customers().update(&id, &draft).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    state.db.customers().delete(&id).await?;
    Ok(Json(Deleted::new("Customer deleted")))
}
