use std::{fmt, str::FromStr};

use time::Duration;

use crate::error::ForecastError;

/// Granularity of a request: drives window alignment, the resampling grid and
/// the forecast horizon.
///
/// | period | step   | horizon | season |
/// |--------|--------|---------|--------|
/// | day    | 1 min  | 1440    | 1440   |
/// | week   | 30 min | 336     | 48     |
/// | month  | 2 h    | 720     | 12     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Spacing of the resampled series and of consecutive forecast points.
    pub fn step(self) -> Duration {
        match self {
            Period::Day => Duration::minutes(1),
            Period::Week => Duration::minutes(30),
            Period::Month => Duration::hours(2),
        }
    }

    /// Number of forecast points produced per request.
    pub fn horizon(self) -> usize {
        match self {
            Period::Day => 1440,
            Period::Week => 336,
            Period::Month => 720,
        }
    }

    /// Season length, in steps, handed to the seasonal model.
    pub fn seasonal_period(self) -> usize {
        match self {
            Period::Day => 1440,
            Period::Week => 48,
            Period::Month => 12,
        }
    }

    /// Minimum spacing of records in display responses; `None` means unmodified.
    pub fn display_gap(self) -> Option<Duration> {
        match self {
            Period::Day => None,
            Period::Week => Some(Duration::minutes(30)),
            Period::Month => Some(Duration::hours(2)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(ForecastError::InvalidPeriod(other.to_string())),
        }
    }
}
