use meter_client::domain::Reading;
use time::Duration;

/// Thin out display records so that kept records are at least `min_gap` apart.
///
/// Greedy single pass over time-ordered records: the first record is always
/// kept, later ones only once they clear `min_gap` after the last kept record.
pub fn compact(records: Vec<Reading>, min_gap: Duration) -> Vec<Reading> {
    let mut kept: Vec<Reading> = Vec::with_capacity(records.len());

    for record in records {
        let keep = match kept.last() {
            None => true,
            Some(last) => record.ts >= last.ts + min_gap,
        };
        if keep {
            kept.push(record);
        }
    }

    kept
}
