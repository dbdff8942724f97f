//! Server configuration.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//! built-in defaults  ──►  shelf.toml (optional)  ──►  SHELF__* environment
//! ```
//!
//! `SHELF__PORT=8080` overrides `port`, `SHELF__DATABASE_PATH=/data/shelf.db`
//! overrides `database_path`, and so on.

use chrono::FixedOffset;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shelf_core::{DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};
use shelf_db::DbConfig;
use thiserror::Error;

/// Minutes in a day; offsets must stay strictly inside ±1 day.
const MINUTES_PER_DAY: i32 = 24 * 60;

/// Shelf API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file, or `:memory:`
    pub database_path: String,

    /// Reference zone for day boundaries, as minutes east of UTC
    pub utc_offset_minutes: i32,

    /// Products at or below this quantity count as low stock
    pub low_stock_threshold: i64,

    /// Products expiring within this many days count as expiring soon
    pub expiry_window_days: i64,

    /// Connection pool size
    pub max_connections: u32,

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl ShelfConfig {
    /// Loads defaults, then `shelf.toml` if present, then `SHELF__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("shelf").required(false))
            .add_source(
                Environment::with_prefix("SHELF")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// Loads defaults overlaid with an inline TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("port", 5001_i64)?
            .set_default("database_path", "./shelf.db")?
            .set_default("utc_offset_minutes", 0_i64)?
            .set_default("low_stock_threshold", DEFAULT_LOW_STOCK_THRESHOLD)?
            .set_default("expiry_window_days", DEFAULT_EXPIRY_WINDOW_DAYS)?
            .set_default("max_connections", 5_i64)?
            .set_default("log_level", "info,shelf_api=debug")?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ShelfConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reference_zone()?;

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue(
                "low_stock_threshold must not be negative".to_string(),
            ));
        }
        if self.expiry_window_days < 0 {
            return Err(ConfigError::InvalidValue(
                "expiry_window_days must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// The fixed UTC offset used for calendar-day boundaries.
    pub fn reference_zone(&self) -> Result<FixedOffset, ConfigError> {
        if self.utc_offset_minutes.abs() >= MINUTES_PER_DAY {
            return Err(ConfigError::InvalidValue(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MINUTES_PER_DAY - 1,
                self.utc_offset_minutes
            )));
        }

        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }

    /// Pool settings for [`shelf_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        if self.database_path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}
