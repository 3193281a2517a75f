use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{Reading, SignalType};

/// Fetch the readings of one meter for `signal` within `[start, end]`.
///
/// Both bounds are inclusive.
pub async fn readings_in_range(
    pool: &PgPool,
    signal: SignalType,
    meter: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<Reading>> {
    // The table name comes from a closed enum, never from caller input.
    let sql = format!(
        r#"
        SELECT
            ts,
            meter,
            value
        FROM {table}
        WHERE meter = $1
          AND ts >= $2
          AND ts <= $3
        ORDER BY ts
        "#,
        table = signal.readings_table(),
    );

    let rows = sqlx::query_as::<_, Reading>(&sql)
        .bind(meter)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
