use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::ForecastPoint;

/// Rows per INSERT statement; keeps the bind count far below the protocol limit.
const INSERT_CHUNK_SIZE: usize = 1000;

/// Insert forecast points, skipping any whose `(meter, ts, signal)` already exists.
///
/// Relies on the unique constraint of `forecast_points`, so concurrent writers
/// cannot produce duplicates. All chunks are written in one transaction.
/// Returns the number of rows actually inserted.
pub async fn insert_forecast_points_if_absent(
    pool: &PgPool,
    points: &[ForecastPoint],
) -> Result<u64> {
    if points.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for chunk in points.chunks(INSERT_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO forecast_points \
             (meter, signal, ts, actual_value, forecast_value, generated_at) ",
        );

        builder.push_values(chunk, |mut b, p| {
            b.push_bind(p.meter)
                .push_bind(p.signal.as_str())
                .push_bind(p.ts)
                .push_bind(p.actual_value)
                .push_bind(p.forecast_value)
                .push_bind(p.generated_at);
        });
        builder.push(" ON CONFLICT (meter, ts, signal) DO NOTHING");

        let result = builder.build().execute(&mut *tx).await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}
