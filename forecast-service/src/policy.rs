use std::{fmt, sync::Arc, time::Instant};

use meter_client::domain::{ForecastPoint, SignalType};
use time::OffsetDateTime;

use crate::{error::ForecastError, model::SeasonalModel, series::Series};

/// Forecast value used when the series holds no data at all.
pub const DEFAULT_FORECAST_VALUE: f64 = 50.0;

/// Fewer present observations than this and the model is not fitted.
pub const MIN_OBSERVATIONS: usize = 48;

/// Which branch of the policy produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Nothing observed: constant default.
    NoData,
    /// Too few observations: flat line at the last value.
    Insufficient,
    /// Fitted seasonal model.
    Seasonal,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::NoData => "no_data",
            Tier::Insufficient => "insufficient",
            Tier::Seasonal => "seasonal",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a forecast is for, stamped onto every produced point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastTarget {
    pub meter: i64,
    pub signal: SignalType,
    pub generated_at: OffsetDateTime,
}

/// Chooses between a default, a flat-line and a model forecast depending on
/// how much data the series holds.
#[derive(Clone)]
pub struct ForecastPolicy {
    model: Arc<dyn SeasonalModel>,
    default_value: f64,
    min_observations: usize,
}

impl ForecastPolicy {
    pub fn new(model: Arc<dyn SeasonalModel>) -> Self {
        Self {
            model,
            default_value: DEFAULT_FORECAST_VALUE,
            min_observations: MIN_OBSERVATIONS,
        }
    }

    pub fn with_default_value(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_min_observations(mut self, min_observations: usize) -> Self {
        self.min_observations = min_observations;
        self
    }

    pub fn tier(&self, series: &Series) -> Tier {
        match series.present_count() {
            0 => Tier::NoData,
            n if n < self.min_observations => Tier::Insufficient,
            _ => Tier::Seasonal,
        }
    }

    /// Produce `period.horizon()` points, one step apart, starting one step
    /// after the last slot of `series`.
    ///
    /// Fitting may take long on large series and blocks the calling thread.
    pub fn forecast(
        &self,
        series: &Series,
        target: &ForecastTarget,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let period = series.period();
        let last_ts = series
            .last_ts()
            .ok_or_else(|| ForecastError::ForecastUnavailable("series has no slots".to_string()))?;
        let horizon = period.horizon();
        let tier = self.tier(series);

        let (actual_value, values) = match (tier, series.last_value()) {
            (Tier::Seasonal, Some(last)) => (last, self.fit_and_predict(series, horizon)?),
            (Tier::Insufficient, Some(last)) => (last, vec![last; horizon]),
            _ => (self.default_value, vec![self.default_value; horizon]),
        };

        metrics::counter!("forecast_tier_total", "tier" => tier.as_str()).increment(1);
        tracing::debug!(
            meter = target.meter,
            signal = %target.signal,
            period = %period,
            %tier,
            present = series.present_count(),
            "forecast tier selected"
        );

        let step = period.step();
        let mut ts = last_ts;
        let mut points = Vec::with_capacity(values.len());
        for forecast_value in values {
            ts = ts
                .checked_add(step)
                .ok_or_else(|| ForecastError::InvalidTimestamp {
                    input: last_ts.to_string(),
                    reason: format!("a {period} forecast runs past the supported date range"),
                })?;
            points.push(ForecastPoint {
                meter: target.meter,
                signal: target.signal,
                ts,
                actual_value,
                forecast_value,
                generated_at: target.generated_at,
            });
        }

        Ok(points)
    }

    fn fit_and_predict(&self, series: &Series, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let period = series.period();
        let started = Instant::now();

        let fitted = self
            .model
            .fit(&series.present_values(), period.seasonal_period())
            .map_err(|e| ForecastError::ForecastUnavailable(format!("model fit failed: {e}")))?;
        let values = fitted
            .predict(horizon)
            .map_err(|e| {
                ForecastError::ForecastUnavailable(format!("model prediction failed: {e}"))
            })?;

        metrics::histogram!("forecast_model_fit_seconds").record(started.elapsed().as_secs_f64());

        if values.len() != horizon {
            return Err(ForecastError::ForecastUnavailable(format!(
                "model returned {} values, expected {horizon}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ForecastUnavailable(
                "model returned non-finite values".to_string(),
            ));
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use meter_client::domain::Reading;
    use time::{macros::datetime, Duration};

    use super::*;
    use crate::{
        model::{EtsModel, FittedModel, ModelError},
        period::Period,
        window::{align, Window},
    };

    /// Records fit calls and either fails or predicts a constant.
    struct StubModel {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubModel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    struct Constant(f64);

    impl FittedModel for Constant {
        fn predict(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.0; steps])
        }
    }

    impl SeasonalModel for StubModel {
        fn fit(
            &self,
            _values: &[f64],
            _seasonal_period: usize,
        ) -> Result<Box<dyn FittedModel>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ModelError::NonFinite("fitting"))
            } else {
                Ok(Box::new(Constant(7.0)))
            }
        }
    }

    fn target() -> ForecastTarget {
        ForecastTarget {
            meter: 7,
            signal: SignalType::Current,
            generated_at: datetime!(2024-03-01 12:00:00 UTC),
        }
    }

    /// Two hours of one-minute slots with a single reading placed so that
    /// exactly `present` slots end up filled.
    fn day_series_with_present(present: i64, value: f64) -> Series {
        let window = align(
            datetime!(2024-03-01 00:00:00 UTC),
            datetime!(2024-03-01 02:00:00 UTC),
            Period::Day,
        )
        .unwrap();
        let first = window.end - Duration::minutes(present - 1);
        let readings = vec![Reading {
            ts: first,
            meter: 7,
            value,
        }];
        Series::build(&readings, &window).unwrap()
    }

    #[test]
    fn no_data_emits_default_constant() {
        let window = align(
            datetime!(2024-03-01 00:00:00 UTC),
            datetime!(2024-03-01 01:00:00 UTC),
            Period::Day,
        )
        .unwrap();
        let series = Series::build(&[], &window).unwrap();
        let model = StubModel::new(false);
        let policy = ForecastPolicy::new(model.clone());

        let points = policy.forecast(&series, &target()).unwrap();
        assert_eq!(points.len(), 1440);
        assert!(points.iter().all(|p| p.forecast_value == DEFAULT_FORECAST_VALUE));
        assert!(points.iter().all(|p| p.actual_value == DEFAULT_FORECAST_VALUE));
        assert_eq!(points[0].ts, datetime!(2024-03-01 01:01:00 UTC));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn below_threshold_is_a_flat_line_at_last_value() {
        let series = day_series_with_present(47, 3.25);
        assert_eq!(series.present_count(), 47);

        let model = StubModel::new(false);
        let policy = ForecastPolicy::new(model.clone());
        assert_eq!(policy.tier(&series), Tier::Insufficient);

        let points = policy.forecast(&series, &target()).unwrap();
        assert_eq!(points.len(), 1440);
        assert!(points.iter().all(|p| p.forecast_value == 3.25 && p.actual_value == 3.25));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn above_threshold_fits_the_model() {
        let series = day_series_with_present(49, 3.25);
        assert_eq!(series.present_count(), 49);

        let model = StubModel::new(false);
        let policy = ForecastPolicy::new(model.clone());
        assert_eq!(policy.tier(&series), Tier::Seasonal);

        let points = policy.forecast(&series, &target()).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert!(points.iter().all(|p| p.forecast_value == 7.0));
        assert!(points.iter().all(|p| p.actual_value == 3.25));
    }

    #[test]
    fn model_failure_is_forecast_unavailable() {
        let series = day_series_with_present(49, 3.25);
        let model = StubModel::new(true);
        let policy = ForecastPolicy::new(model.clone());

        let err = policy.forecast(&series, &target()).unwrap_err();
        assert!(matches!(err, ForecastError::ForecastUnavailable(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn threshold_and_default_are_configurable() {
        let series = day_series_with_present(49, 3.25);
        let policy = ForecastPolicy::new(StubModel::new(false)).with_min_observations(100);
        assert_eq!(policy.tier(&series), Tier::Insufficient);

        let empty = day_series_with_present(0, 0.0);
        let policy = ForecastPolicy::new(StubModel::new(false)).with_default_value(-1.0);
        let points = policy.forecast(&empty, &target()).unwrap();
        assert!(points.iter().all(|p| p.forecast_value == -1.0));
    }

    #[test]
    fn points_are_contiguous_from_one_step_after_the_series() {
        let model: Arc<dyn SeasonalModel> = Arc::new(EtsModel::new());
        let start = datetime!(2024-03-06 00:00:00 UTC);

        for period in [Period::Day, Period::Week, Period::Month] {
            let window: Window = align(start, start + Duration::days(1), period).unwrap();
            let readings: Vec<Reading> = (0..400i32)
                .map(|i| Reading {
                    ts: window.start + period.step() * i,
                    meter: 7,
                    value: 10.0 + (i % 5) as f64,
                })
                .collect();
            let series = Series::build(&readings, &window).unwrap();
            let last = series.last_ts().unwrap();

            let points = ForecastPolicy::new(model.clone())
                .forecast(&series, &target())
                .unwrap();

            assert_eq!(points.len(), period.horizon(), "{period}");
            assert_eq!(points[0].ts, last + period.step(), "{period}");
            assert!(points.windows(2).all(|w| w[1].ts - w[0].ts == period.step()), "{period}");
            assert!(points.iter().all(|p| p.meter == 7 && p.signal == SignalType::Current));
        }
    }

    #[test]
    fn partial_day_of_rising_readings_forecasts_from_the_last_level() {
        // 120 present minutes climbing from 0 to about 60, well short of a day.
        let window = align(
            datetime!(2024-03-01 00:00:00 UTC),
            datetime!(2024-03-01 01:59:00 UTC),
            Period::Day,
        )
        .unwrap();
        let readings: Vec<Reading> = (0..120i32)
            .map(|i| Reading {
                ts: window.start + Duration::minutes(1) * i,
                meter: 7,
                value: f64::from(i) * 0.5 + 0.2 * (f64::from(i) * 0.9).sin(),
            })
            .collect();
        let series = Series::build(&readings, &window).unwrap();
        assert_eq!(series.present_count(), 120);

        let policy = ForecastPolicy::new(Arc::new(EtsModel::new()));
        assert_eq!(policy.tier(&series), Tier::Seasonal);

        let points = policy.forecast(&series, &target()).unwrap();
        let last = series.last_value().unwrap();
        assert_eq!(points.len(), 1440);
        assert!((points[0].forecast_value - last).abs() < 3.0, "{}", points[0].forecast_value);
        assert!(points.iter().all(|p| p.forecast_value > last - 5.0));
        assert!(points.iter().all(|p| p.actual_value == last));
    }

    #[test]
    fn horizon_past_the_last_representable_date_is_rejected() {
        let window = align(
            datetime!(9999-12-31 22:00:00 UTC),
            datetime!(9999-12-31 23:00:00 UTC),
            Period::Day,
        )
        .unwrap();
        let series = Series::build(&[], &window).unwrap();

        let err = ForecastPolicy::new(StubModel::new(false))
            .forecast(&series, &target())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidTimestamp { .. }));
    }
}
