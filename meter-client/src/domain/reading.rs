use time::OffsetDateTime;

/// A single metered sample as stored in one of the `<signal>_readings` tables.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub meter: i64,
    pub value: f64,
}
