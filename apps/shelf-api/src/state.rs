//! Shared application state handed to every handler.

use std::sync::Arc;

use shelf_core::aggregate::AggregationEngine;
use shelf_core::recorder::SaleRecorder;
use shelf_db::Database;

use crate::config::{ConfigError, ShelfConfig};

/// Cloned per request; everything inside is behind an `Arc` or a pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub recorder: Arc<SaleRecorder>,
    pub engine: Arc<AggregationEngine>,
    pub config: Arc<ShelfConfig>,
}

impl AppState {
    /// Wires the recorder and the aggregation engine to the SQLite stores.
    pub fn new(db: Database, config: ShelfConfig) -> Result<Self, ConfigError> {
        let zone = config.reference_zone()?;

        let recorder = SaleRecorder::new(
            Arc::new(db.ledger()),
            Arc::new(db.sales()),
            Arc::new(db.products()),
        );
        let engine = AggregationEngine::new(Arc::new(db.products()), Arc::new(db.sales()), zone);

        Ok(AppState {
            db,
            recorder: Arc::new(recorder),
            engine: Arc::new(engine),
            config: Arc::new(config),
        })
    }
}
