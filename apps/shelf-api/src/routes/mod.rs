//! HTTP routes.

pub mod customers;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod sales;

use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Body returned by DELETE endpoints.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

impl Deleted {
    pub fn new(message: &'static str) -> Self {
        Deleted { message }
    }
}

/// Everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sales",
            get(sales::list_sales).post(sales::create_sale),
        )
        .route("/sales/:id", get(sales::get_sale))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/alerts", get(dashboard::alerts))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            axum::routing::put(customers::update_customer).delete(customers::delete_customer),
        )
}
