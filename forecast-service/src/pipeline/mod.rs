use std::sync::Arc;

use meter_client::domain::{ForecastPoint, Reading, SignalType};
use time::OffsetDateTime;

use crate::{
    compact::compact,
    error::ForecastError,
    period::Period,
    policy::{ForecastPolicy, ForecastTarget},
    series::Series,
    store::{ForecastStore, ReadingSource},
    timestamp::parse_timestamp,
    window::{align, Window},
};

/// Entry points of the service: the forecast path and the display fetch path.
#[derive(Clone)]
pub struct ForecastPipeline {
    readings: Arc<dyn ReadingSource>,
    forecasts: Arc<dyn ForecastStore>,
    policy: ForecastPolicy,
}

/// Parse the raw request bounds and period and align them.
pub fn resolve_window(start: &str, end: &str, period: &str) -> Result<Window, ForecastError> {
    let period: Period = period.parse()?;
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    align(start, end, period)
}

fn record_error(e: &ForecastError) {
    metrics::counter!("forecast_errors_total", "kind" => e.kind()).increment(1);
    if e.is_client_error() {
        tracing::info!(error = %e, kind = e.kind(), "request rejected");
    } else {
        tracing::error!(error = %e, kind = e.kind(), "request failed");
    }
}

impl ForecastPipeline {
    pub fn new(
        readings: Arc<dyn ReadingSource>,
        forecasts: Arc<dyn ForecastStore>,
        policy: ForecastPolicy,
    ) -> Self {
        Self {
            readings,
            forecasts,
            policy,
        }
    }

    /// Forecast `signal` for `meter` over the aligned window and store the
    /// points that are not stored yet.
    ///
    /// Returns every produced point, including ones that were already stored.
    pub async fn run_forecast(
        &self,
        signal: SignalType,
        meter: i64,
        start: &str,
        end: &str,
        period: &str,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        metrics::counter!("forecast_requests_total").increment(1);
        self.forecast(signal, meter, start, end, period)
            .await
            .inspect_err(record_error)
    }

    /// Same as [`run_forecast`](Self::run_forecast), with the signal given by
    /// name (`current`, `forecast-voltage-data`, ...).
    pub async fn run_forecast_by_type(
        &self,
        signal: &str,
        meter: i64,
        start: &str,
        end: &str,
        period: &str,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        metrics::counter!("forecast_requests_total").increment(1);
        let result = match signal.parse::<SignalType>() {
            Ok(signal) => self.forecast(signal, meter, start, end, period).await,
            Err(e) => Err(e.into()),
        };
        result.inspect_err(record_error)
    }

    /// Readings of the aligned window, thinned out for display on week and
    /// month periods.
    pub async fn run_windowed_fetch(
        &self,
        signal: SignalType,
        meter: i64,
        start: &str,
        end: &str,
        period: &str,
    ) -> Result<Vec<Reading>, ForecastError> {
        metrics::counter!("readings_fetch_requests_total").increment(1);
        self.windowed_fetch(signal, meter, start, end, period)
            .await
            .inspect_err(record_error)
    }

    async fn forecast(
        &self,
        signal: SignalType,
        meter: i64,
        start: &str,
        end: &str,
        period: &str,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let window = resolve_window(start, end, period)?;
        let readings = self.fetch(signal, meter, &window).await?;
        let series = Series::build(&readings, &window)?;

        let policy = self.policy.clone();
        let target = ForecastTarget {
            meter,
            signal,
            generated_at: OffsetDateTime::now_utc(),
        };
        let points = tokio::task::spawn_blocking(move || policy.forecast(&series, &target))
            .await
            .map_err(|e| {
                ForecastError::ForecastUnavailable(format!("forecast task failed: {e}"))
            })??;

        let inserted = self.forecasts.save(&points).await?;
        metrics::counter!("forecast_points_inserted_total").increment(inserted);

        tracing::info!(
            meter,
            signal = %signal,
            period = %window.period,
            points = points.len(),
            inserted,
            "forecast stored"
        );

        Ok(points)
    }

    async fn windowed_fetch(
        &self,
        signal: SignalType,
        meter: i64,
        start: &str,
        end: &str,
        period: &str,
    ) -> Result<Vec<Reading>, ForecastError> {
        let window = resolve_window(start, end, period)?;
        let mut readings = self.fetch(signal, meter, &window).await?;
        readings.sort_by_key(|r| r.ts);

        let fetched = readings.len();
        let records = match window.period.display_gap() {
            Some(gap) => compact(readings, gap),
            None => readings,
        };

        tracing::debug!(
            meter,
            signal = %signal,
            period = %window.period,
            fetched,
            returned = records.len(),
            "readings fetched"
        );

        Ok(records)
    }

    async fn fetch(
        &self,
        signal: SignalType,
        meter: i64,
        window: &Window,
    ) -> Result<Vec<Reading>, ForecastError> {
        let readings = self.readings.query(signal, meter, window.start, window.end).await?;
        if readings.is_empty() {
            return Err(ForecastError::NoDataFound { signal, meter });
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::EtsModel, store::MemoryStore};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use time::{macros::datetime, Duration};

    fn pipeline(store: Arc<MemoryStore>) -> ForecastPipeline {
        ForecastPipeline::new(
            store.clone(),
            store,
            ForecastPolicy::new(Arc::new(EtsModel::new())),
        )
    }

    #[test]
    fn resolve_window_aligns_and_validates() {
        let w = resolve_window("2024-02-15T00:00:00Z", "2024-02-15T06:00:00Z", "month").unwrap();
        assert_eq!(w.start, datetime!(2024-02-01 00:00:00 UTC));
        assert_eq!(w.end, datetime!(2024-02-29 00:00:00 UTC));

        assert!(matches!(
            resolve_window("2024-02-15T00:00:00Z", "2024-02-15T06:00:00Z", "fortnight"),
            Err(ForecastError::InvalidPeriod(_))
        ));
        assert!(matches!(
            resolve_window("15/02/2024", "2024-02-15T06:00:00Z", "day"),
            Err(ForecastError::InvalidTimestamp { .. })
        ));
    }

    #[tokio::test]
    async fn empty_window_is_no_data_found() {
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(store)
            .run_forecast(
                SignalType::Voltage,
                3,
                "2024-03-01T00:00:00Z",
                "2024-03-01T01:00:00Z",
                "day",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::NoDataFound { signal: SignalType::Voltage, meter: 3 }
        ));
    }

    #[tokio::test]
    async fn week_fetch_is_sorted_and_compacted() {
        let store = Arc::new(MemoryStore::new());
        let start = datetime!(2024-03-03 00:00:00 UTC);
        // Ten-minute readings, pushed in reverse order.
        let readings: Vec<_> = (0..36i32)
            .rev()
            .map(|i| Reading {
                ts: start + Duration::minutes(10) * i,
                meter: 7,
                value: f64::from(i),
            })
            .collect();
        store.add_readings(SignalType::Power, readings).await;

        let records = pipeline(store)
            .run_windowed_fetch(
                SignalType::Power,
                7,
                "2024-03-06T00:00:00Z",
                "2024-03-06T00:00:00Z",
                "week",
            )
            .await
            .unwrap();

        let values: Vec<_> = records.iter().map(|r| r.value).collect();
        let expected: Vec<f64> = (0..12).map(|i| f64::from(i * 3)).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test]
    async fn day_fetch_is_returned_unmodified() {
        let store = Arc::new(MemoryStore::new());
        let start = datetime!(2024-03-01 00:00:00 UTC);
        let readings: Vec<_> = (0..10i32)
            .map(|i| Reading {
                ts: start + Duration::seconds(5) * i,
                meter: 7,
                value: 1.0,
            })
            .collect();
        store.add_readings(SignalType::Current, readings).await;

        let records = pipeline(store)
            .run_windowed_fetch(
                SignalType::Current,
                7,
                "2024-03-01T00:00:00Z",
                "2024-03-01T00:01:00Z",
                "day",
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 10);
    }

    #[test]
    fn unknown_signal_type_is_counted_as_an_error() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let pipeline = pipeline(Arc::new(MemoryStore::new()));

        let err = metrics::with_local_recorder(&recorder, || {
            runtime.block_on(pipeline.run_forecast_by_type(
                "forecast-frequency-data",
                7,
                "2024-03-01T00:00:00Z",
                "2024-03-01T01:00:00Z",
                "day",
            ))
        })
        .unwrap_err();

        assert!(matches!(err, ForecastError::InvalidSignal(_)));
        let rendered = handle.render();
        assert!(
            rendered.contains(r#"forecast_errors_total{kind="invalid_signal"} 1"#),
            "{rendered}"
        );
        assert!(rendered.contains("forecast_requests_total 1"), "{rendered}");
    }

    #[tokio::test]
    async fn oversized_day_window_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        store
            .add_readings(
                SignalType::Current,
                [Reading {
                    ts: datetime!(2024-03-01 00:00:00 UTC),
                    meter: 7,
                    value: 1.0,
                }],
            )
            .await;

        let err = pipeline(store)
            .run_forecast(
                SignalType::Current,
                7,
                "2024-03-01T00:00:00Z",
                "9000-01-01T00:00:00Z",
                "day",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidTimestamp { .. }));
    }

    #[test]
    fn week_near_the_end_of_time_is_rejected() {
        let err =
            resolve_window("9999-12-30T00:00:00Z", "9999-12-30T00:00:00Z", "week").unwrap_err();
        assert!(matches!(err, ForecastError::InvalidTimestamp { .. }));
    }
}
