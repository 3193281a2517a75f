use std::collections::BTreeMap;

use meter_client::domain::{ForecastPoint, Reading, SignalType};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::{ForecastStore, ReadingSource};
use crate::error::ForecastError;

type ForecastKey = (i64, SignalType, OffsetDateTime);

/// Process-local reading source and forecast store.
///
/// The existence check and the insert happen under one lock, so concurrent
/// saves of the same identity still store it once.
#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<(SignalType, Reading)>>,
    forecasts: Mutex<BTreeMap<ForecastKey, ForecastPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_readings<I>(&self, signal: SignalType, readings: I)
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut guard = self.readings.lock().await;
        guard.extend(readings.into_iter().map(|r| (signal, r)));
    }

    /// Stored forecast points ordered by meter, signal and timestamp.
    pub async fn forecast_points(&self) -> Vec<ForecastPoint> {
        self.forecasts.lock().await.values().cloned().collect()
    }
}

#[async_trait::async_trait]
impl ReadingSource for MemoryStore {
    async fn query(
        &self,
        signal: SignalType,
        meter: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, ForecastError> {
        let guard = self.readings.lock().await;
        let rows = guard
            .iter()
            .filter(|(s, r)| *s == signal && r.meter == meter && r.ts >= start && r.ts <= end)
            .map(|(_, r)| r.clone())
            .collect();
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ForecastStore for MemoryStore {
    async fn save(&self, points: &[ForecastPoint]) -> Result<u64, ForecastError> {
        let mut guard = self.forecasts.lock().await;
        let mut inserted = 0;
        for point in points {
            if let std::collections::btree_map::Entry::Vacant(slot) = guard.entry(point.key()) {
                slot.insert(point.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
