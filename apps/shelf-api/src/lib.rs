//! # shelf-api: REST Server for Shelf
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  client ──► TraceLayer ──► CorsLayer ──► Router                         │
//! │                                            │                            │
//! │         ┌──────────────────────────────────┼───────────────────┐        │
//! │         ▼                                  ▼                   ▼        │
//! │   routes::sales              routes::dashboard      routes::products    │
//! │   SaleRecorder               AggregationEngine      ProductRepository   │
//! │         │                                  │                   │        │
//! │         └────────────► shelf-db (SQLite pool) ◄────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` loads [`config::ShelfConfig`], opens the database
//! and serves [`build_router`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ShelfConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", routes::api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .with_state(state)
}
