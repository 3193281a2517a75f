use meter_client::domain::{SignalType, UnknownSignal};

/// Terminal failure of a forecast or fetch request. No variant is retried.
#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("invalid time period '{0}', use 'day', 'week' or 'month'")]
    InvalidPeriod(String),
    #[error(transparent)]
    InvalidSignal(#[from] UnknownSignal),
    #[error("invalid date format '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },
    #[error("no {signal} data found for meter {meter} within the given time range")]
    NoDataFound { signal: SignalType, meter: i64 },
    #[error("forecast unavailable: {0}")]
    ForecastUnavailable(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ForecastError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::InvalidPeriod(_) => "invalid_period",
            ForecastError::InvalidSignal(_) => "invalid_signal",
            ForecastError::InvalidTimestamp { .. } => "invalid_timestamp",
            ForecastError::NoDataFound { .. } => "no_data_found",
            ForecastError::ForecastUnavailable(_) => "forecast_unavailable",
            ForecastError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Whether the caller, rather than the service or its dependencies, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InvalidPeriod(_)
                | ForecastError::InvalidSignal(_)
                | ForecastError::InvalidTimestamp { .. }
                | ForecastError::NoDataFound { .. }
        )
    }
}
