use time::{util::days_in_year_month, Duration, OffsetDateTime};

use crate::{error::ForecastError, period::Period};

/// A request range after alignment to its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub period: Period,
}

impl Window {
    /// Grid slots from `start` through `end` at the period step, at least one.
    pub fn slot_count(&self) -> usize {
        let span = (self.end - self.start).whole_seconds();
        if span <= 0 {
            return 1;
        }
        let slots = span / self.period.step().whole_seconds() + 1;
        usize::try_from(slots).unwrap_or(usize::MAX)
    }
}

fn out_of_range(ts: OffsetDateTime, period: Period) -> ForecastError {
    ForecastError::InvalidTimestamp {
        input: ts.to_string(),
        reason: format!("the aligned {period} window falls outside the supported date range"),
    }
}

/// Map a requested range onto the canonical window for `period`.
///
/// - day: bounds are taken as given.
/// - week: starts on the Sunday at or before `start`, ends seven days later.
/// - month: first to last day of `start`'s month.
///
/// Time of day is preserved, so aligning an aligned week or month is a no-op.
pub fn align(
    start: OffsetDateTime,
    end: OffsetDateTime,
    period: Period,
) -> Result<Window, ForecastError> {
    let shift = |ts: OffsetDateTime, days: i64| {
        ts.checked_add(Duration::days(days))
            .ok_or_else(|| out_of_range(start, period))
    };

    let window = match period {
        Period::Day => Window { start, end, period },
        Period::Week => {
            let back = (i64::from(start.weekday().number_days_from_monday()) + 1) % 7;
            let start = shift(start, -back)?;
            Window {
                start,
                end: shift(start, 7)?,
                period,
            }
        }
        Period::Month => {
            let start = shift(start, 1 - i64::from(start.day()))?;
            let days = days_in_year_month(start.year(), start.month());
            Window {
                start,
                end: shift(start, i64::from(days) - 1)?,
                period,
            }
        }
    };

    Ok(window)
}
