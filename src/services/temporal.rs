//! Temporal filtering of raw weather records.
//!
//! Dataset timestamps use "YYYY-MM-DD HH:MM:SS" while callers send the
//! `datetime-local` form "YYYY-MM-DDTHH:MM". Matching is exact string equality
//! against the normalized target; there is no range or nearest-time match.

use crate::data::models::WeatherRecord;

/// Convert "YYYY-MM-DDTHH:MM" into the dataset form "YYYY-MM-DD HH:MM:00".
///
/// Returns `None` unless the input splits on `'T'` into exactly two parts.
pub fn normalize_date_time(selected: &str) -> Option<String> {
    let mut parts = selected.split('T');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(date), Some(time), None) => Some(format!("{} {}:00", date, time)),
        _ => None,
    }
}

/// Records whose `time` equals `target` exactly, in input order.
///
/// A `None` target matches nothing.
pub fn filter_by_date_time<'a>(
    records: &'a [WeatherRecord],
    target: Option<&str>,
) -> Vec<&'a WeatherRecord> {
    let Some(target) = target else {
        return Vec::new();
    };

    records
        .iter()
        .filter(|record| {
            let matches = record.time == target;
            if !matches {
                tracing::debug!(
                    "Record at ({}, {}) filtered out: time '{}' != '{}'",
                    record.latitude,
                    record.longitude,
                    record.time,
                    target
                );
            }
            matches
        })
        .collect()
}
