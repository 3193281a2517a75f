use meter_client::{
    db,
    domain::{ForecastPoint, Reading, SignalType},
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use time::OffsetDateTime;

use super::{ForecastStore, ReadingSource};
use crate::{config::DatabaseConfig, error::ForecastError};

/// Reading source and forecast store backed by one PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.uri)
            .await?;
        Ok(Self::new(pool))
    }
}

fn storage_error(what: &str, e: anyhow::Error) -> ForecastError {
    tracing::error!(error = %format!("{e:#}"), "{what} failed");
    ForecastError::StorageUnavailable(format!("{what} failed: {e:#}"))
}

#[async_trait::async_trait]
impl ReadingSource for PgStore {
    async fn query(
        &self,
        signal: SignalType,
        meter: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, ForecastError> {
        db::readings_in_range(&self.pool, signal, meter, start, end)
            .await
            .map_err(|e| storage_error("reading query", e))
    }
}

#[async_trait::async_trait]
impl ForecastStore for PgStore {
    async fn save(&self, points: &[ForecastPoint]) -> Result<u64, ForecastError> {
        db::insert_forecast_points_if_absent(&self.pool, points)
            .await
            .map_err(|e| storage_error("forecast insert", e))
    }
}
