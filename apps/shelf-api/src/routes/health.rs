use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use shelf_db::MigrationStatus;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationsBody>,
}

#[derive(Debug, Serialize)]
pub struct MigrationsBody {
    pub applied: usize,
    pub embedded: usize,
}

impl From<MigrationStatus> for MigrationsBody {
    fn from(status: MigrationStatus) -> Self {
        MigrationsBody {
            applied: status.applied,
            embedded: status.embedded,
        }
    }
}

/// `GET /health`. 503 when the database stops answering or its schema is
/// behind the embedded migrations.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let migrations = if state.db.health_check().await {
        match state.db.migration_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Migration status unavailable");
                None
            }
        }
    } else {
        None
    };

    let (code, status) = match migrations {
        Some(m) if m.is_current() => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        code,
        Json(HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            migrations: migrations.map(MigrationsBody::from),
        }),
    )
}
