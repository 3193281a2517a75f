use serde::Serialize;
use time::OffsetDateTime;

use super::SignalType;

/// One forecast step for a meter and signal.
///
/// `(meter, ts, signal)` is the identity of a point; the forecast table holds
/// at most one row per identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub meter: i64,
    pub signal: SignalType,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    /// Last known actual value, carried forward across the horizon.
    pub actual_value: f64,
    pub forecast_value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl ForecastPoint {
    pub fn key(&self) -> (i64, SignalType, OffsetDateTime) {
        (self.meter, self.signal, self.ts)
    }
}
