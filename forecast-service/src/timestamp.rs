use time::{
    format_description::well_known::{Iso8601, Rfc3339},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use crate::error::ForecastError;

/// Parse a caller-supplied ISO-8601 timestamp and normalize it to UTC.
///
/// A trailing `Z` means `+00:00`. A date-time without any offset is taken as
/// UTC, and a bare date as midnight UTC.
pub fn parse_timestamp(input: &str) -> Result<OffsetDateTime, ForecastError> {
    let trimmed = input.trim();

    if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(ts.to_offset(UtcOffset::UTC));
    }

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight().assume_utc());
    }

    PrimitiveDateTime::parse(trimmed, &Iso8601::DEFAULT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| ForecastError::InvalidTimestamp {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })
}
