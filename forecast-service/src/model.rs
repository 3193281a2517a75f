//! Seasonal forecasting models.
//!
//! The forecast policy only sees the [`SeasonalModel`] trait; [`EtsModel`]
//! is the implementation wired in by the service.

use augurs::{ets::AutoETS, mstl::MSTLModel, Fit, Predict};

/// Fewest observations an exponential smoothing fit is attempted on.
pub const MIN_FIT_OBSERVATIONS: usize = 10;

/// Full seasons needed before the seasonal component is estimated.
const MIN_SEASONS: usize = 2;

/// Failure to fit a model or to produce predictions from it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("non-finite value encountered while {0}")]
    NonFinite(&'static str),
    #[error("fit error: {0}")]
    Fit(String),
    #[error("predict error: {0}")]
    Predict(String),
}

/// A model that can be fitted to an evenly spaced series with a known season length.
pub trait SeasonalModel: Send + Sync {
    fn fit(
        &self,
        values: &[f64],
        seasonal_period: usize,
    ) -> Result<Box<dyn FittedModel>, ModelError>;
}

/// A fitted model, ready to predict the steps following the fitted data.
pub trait FittedModel: Send {
    fn predict(&self, steps: usize) -> Result<Vec<f64>, ModelError>;
}

/// Exponential smoothing with automatic model selection.
///
/// Series covering at least two full seasons are decomposed with MSTL and the
/// deseasonalized remainder is forecast with AutoETS. Shorter series get a
/// non-seasonal AutoETS, which carries the recent level and trend forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct EtsModel;

impl EtsModel {
    pub fn new() -> Self {
        Self
    }

    /// Whether `observations` values are enough to estimate a season of
    /// `seasonal_period` steps.
    pub fn is_seasonal(observations: usize, seasonal_period: usize) -> bool {
        seasonal_period > 1 && observations >= MIN_SEASONS * seasonal_period
    }
}

impl SeasonalModel for EtsModel {
    fn fit(
        &self,
        values: &[f64],
        seasonal_period: usize,
    ) -> Result<Box<dyn FittedModel>, ModelError> {
        if values.len() < MIN_FIT_OBSERVATIONS {
            return Err(ModelError::InsufficientData {
                required: MIN_FIT_OBSERVATIONS,
                actual: values.len(),
            });
        }
        if seasonal_period == 0 {
            return Err(ModelError::InvalidParameter {
                name: "seasonal_period",
                reason: "must be at least 1".to_string(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("reading the input series"));
        }

        if Self::is_seasonal(values.len(), seasonal_period) {
            let trend = AutoETS::non_seasonal().into_trend_model();
            fit_boxed(MSTLModel::new(vec![seasonal_period], trend), values)
        } else {
            fit_boxed(AutoETS::non_seasonal(), values)
        }
    }
}

fn fit_boxed<M>(model: M, values: &[f64]) -> Result<Box<dyn FittedModel>, ModelError>
where
    M: Fit,
    M::Fitted: Send + 'static,
{
    let fitted = model
        .fit(values)
        .map_err(|e| ModelError::Fit(e.to_string()))?;
    Ok(Box::new(Fitted(fitted)))
}

struct Fitted<P>(P);

impl<P: Predict + Send> FittedModel for Fitted<P> {
    fn predict(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        let forecast = self
            .0
            .predict(steps, None)
            .map_err(|e| ModelError::Predict(e.to_string()))?;
        if forecast.point.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("predicting"));
        }
        Ok(forecast.point)
    }
}
