//! Storage seam of the pipeline.
//!
//! The pipeline receives both collaborators at construction time; the process
//! bootstrap owns their lifecycle.

use meter_client::domain::{ForecastPoint, Reading, SignalType};
use time::OffsetDateTime;

use crate::error::ForecastError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait::async_trait]
pub trait ReadingSource: Send + Sync {
    /// Readings of `meter` for `signal` with `start <= ts <= end`, in no
    /// particular order.
    async fn query(
        &self,
        signal: SignalType,
        meter: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, ForecastError>;
}

#[async_trait::async_trait]
pub trait ForecastStore: Send + Sync {
    /// Insert each point unless one with the same `(meter, ts, signal)` is
    /// already stored. Existing points are never modified.
    ///
    /// Returns how many points were inserted.
    async fn save(&self, points: &[ForecastPoint]) -> Result<u64, ForecastError>;
}
