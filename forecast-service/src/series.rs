use meter_client::domain::Reading;
use time::OffsetDateTime;

use crate::{error::ForecastError, period::Period, window::Window};

/// Largest grid a forecast window may resample to. A day window at one-minute
/// steps covers a little over 69 days.
pub const MAX_SERIES_SLOTS: usize = 100_000;

/// One grid position of a resampled series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub ts: OffsetDateTime,
    pub value: Option<f64>,
}

/// Readings resampled onto the fixed grid of a period.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    period: Period,
    slots: Vec<Slot>,
}

impl Series {
    /// Resample `readings` onto `window.start + k * step` for every slot up to
    /// `window.end`.
    ///
    /// Each slot takes the last reading at or before it; slots before the first
    /// reading stay empty. Input order does not matter, and among readings with
    /// the same timestamp the one that arrived last wins.
    ///
    /// Windows spanning more than [`MAX_SERIES_SLOTS`] slots are rejected.
    pub fn build(readings: &[Reading], window: &Window) -> Result<Self, ForecastError> {
        let step = window.period.step();
        let slot_count = window.slot_count();
        if slot_count > MAX_SERIES_SLOTS {
            return Err(ForecastError::InvalidTimestamp {
                input: format!("{} to {}", window.start, window.end),
                reason: format!(
                    "the {} window spans {slot_count} slots, the limit is {MAX_SERIES_SLOTS}",
                    window.period
                ),
            });
        }

        let mut sorted: Vec<&Reading> = readings.iter().collect();
        sorted.sort_by_key(|r| r.ts);
        let mut pending = sorted.into_iter().peekable();

        let mut slots = Vec::with_capacity(slot_count);
        let mut last = None;
        let mut ts = window.start;
        loop {
            while let Some(reading) = pending.next_if(|r| r.ts <= ts) {
                last = Some(reading.value);
            }
            slots.push(Slot { ts, value: last });

            match ts.checked_add(step) {
                Some(next) if next <= window.end => ts = next,
                _ => break,
            }
        }

        Ok(Self {
            period: window.period,
            slots,
        })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn last_ts(&self) -> Option<OffsetDateTime> {
        self.slots.last().map(|s| s.ts)
    }

    pub fn present_values(&self) -> Vec<f64> {
        self.slots.iter().filter_map(|s| s.value).collect()
    }

    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    /// Most recent present value.
    pub fn last_value(&self) -> Option<f64> {
        self.slots.iter().rev().find_map(|s| s.value)
    }
}
