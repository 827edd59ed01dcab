//! Spatial filtering: coordinate parsing, deduplication and region containment.

use std::collections::HashSet;

use crate::data::models::{WeatherRecord, WeatherSample};
use crate::services::region::RegionPolygon;

/// Per-reason exclusion counts for one filtering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Records whose time did not match the requested instant
    pub date_time_mismatch: usize,
    /// Records whose latitude/longitude did not parse to finite numbers
    pub invalid_coordinates: usize,
    /// Records sharing a coordinate with an earlier record
    pub duplicate: usize,
    /// Records outside the region polygon
    pub outside_region: usize,
    /// Records kept
    pub retained: usize,
}

/// Deduplication identity of a point: the exact (longitude, latitude) pair.
///
/// `-0.0` and `0.0` map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    longitude_bits: u64,
    latitude_bits: u64,
}

impl CoordinateKey {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        let canonical = |v: f64| if v == 0.0 { 0.0_f64 } else { v };
        Self {
            longitude_bits: canonical(longitude).to_bits(),
            latitude_bits: canonical(latitude).to_bits(),
        }
    }
}

/// Parse, deduplicate and keep records inside `polygon`, in scan order.
///
/// A coordinate is claimed by the first record that parses to it, even if that
/// record is then dropped for lying outside the region.
pub fn filter_within_region<'a, I>(
    records: I,
    polygon: &RegionPolygon,
) -> (Vec<WeatherSample>, FilterReport)
where
    I: IntoIterator<Item = &'a WeatherRecord>,
{
    let mut seen: HashSet<CoordinateKey> = HashSet::new();
    let mut report = FilterReport::default();
    let mut points = Vec::new();

    for record in records {
        let sample = match WeatherSample::from_record(record) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::debug!("Point filtered out due to {}: {:?}", e, record);
                report.invalid_coordinates += 1;
                continue;
            }
        };

        if !seen.insert(CoordinateKey::new(sample.longitude, sample.latitude)) {
            tracing::debug!(
                "Point filtered out due to duplicate coordinates ({}, {})",
                sample.longitude,
                sample.latitude
            );
            report.duplicate += 1;
            continue;
        }

        if !polygon.contains(sample.longitude, sample.latitude) {
            tracing::debug!(
                "Point ({}, {}) filtered out: not in region '{}'",
                sample.longitude,
                sample.latitude,
                polygon.name
            );
            report.outside_region += 1;
            continue;
        }

        points.push(sample);
    }

    report.retained = points.len();
    (points, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wkt::parse_wkt;

    fn unit_square() -> RegionPolygon {
        RegionPolygon {
            name: "unit".to_string(),
            geometry: parse_wkt("POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))").unwrap(),
        }
    }

    fn record(lon: &str, lat: &str, sp: &str) -> WeatherRecord {
        WeatherRecord {
            latitude: lat.to_string(),
            longitude: lon.to_string(),
            time: "2022-10-05 00:00:00".to_string(),
            sp: sp.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_outside_point_excluded() {
        let records = vec![
            record("0.1", "0.1", "10"),
            record("0.9", "0.1", "10"),
            record("5", "5", "99"),
        ];
        let (points, report) = filter_within_region(&records, &unit_square());

        assert_eq!(points.len(), 2);
        assert_eq!((points[0].longitude, points[0].latitude), (0.1, 0.1));
        assert_eq!((points[1].longitude, points[1].latitude), (0.9, 0.1));
        assert_eq!(report.outside_region, 1);
        assert_eq!(report.retained, 2);
    }

    #[test]
    fn test_duplicate_first_wins() {
        let records = vec![record("0.5", "0.5", "100"), record("0.5", "0.5", "200")];
        let (points, report) = filter_within_region(&records, &unit_square());

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].sp, 100.0);
        assert_eq!(report.duplicate, 1);
    }

    #[test]
    fn test_duplicate_spelling_variants_collide() {
        let records = vec![record("0.50", "0.5", "1"), record("0.5", "0.500", "2")];
        let (points, _) = filter_within_region(&records, &unit_square());
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_duplicate_of_outside_point_still_counted_as_duplicate() {
        let records = vec![record("5", "5", "1"), record("5", "5", "2")];
        let (points, report) = filter_within_region(&records, &unit_square());
        assert!(points.is_empty());
        assert_eq!(report.outside_region, 1);
        assert_eq!(report.duplicate, 1);
    }

    #[test]
    fn test_malformed_coordinate_excluded() {
        let records = vec![
            record("abc", "0.5", "1"),
            record("0.5", "", "1"),
            record("0.2", "0.2", "1"),
        ];
        let (points, report) = filter_within_region(&records, &unit_square());
        assert_eq!(points.len(), 1);
        assert_eq!(report.invalid_coordinates, 2);
    }

    #[test]
    fn test_no_duplicate_coordinates_in_output() {
        let records: Vec<WeatherRecord> = (0..200)
            .map(|i| {
                let lon = format!("{}", (i % 7) as f64 / 10.0);
                let lat = format!("{}", (i % 5) as f64 / 10.0);
                record(&lon, &lat, &i.to_string())
            })
            .collect();
        let (points, report) = filter_within_region(&records, &unit_square());

        let keys: HashSet<CoordinateKey> = points
            .iter()
            .map(|p| CoordinateKey::new(p.longitude, p.latitude))
            .collect();
        assert_eq!(keys.len(), points.len());
        assert_eq!(points.len(), 35);
        assert_eq!(report.duplicate, 165);
    }

    #[test]
    fn test_scan_order_preserved() {
        let records = vec![
            record("0.9", "0.9", "1"),
            record("0.1", "0.1", "2"),
            record("0.5", "0.5", "3"),
        ];
        let (points, _) = filter_within_region(&records, &unit_square());
        let values: Vec<f64> = points.iter().map(|p| p.sp).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_coordinate_key_signed_zero() {
        assert_eq!(CoordinateKey::new(-0.0, 1.0), CoordinateKey::new(0.0, 1.0));
        assert_ne!(CoordinateKey::new(1.0, 2.0), CoordinateKey::new(2.0, 1.0));
    }
}
