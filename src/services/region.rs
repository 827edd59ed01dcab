//! Region boundary resolution.
//!
//! The region dataset is a CSV with one descriptive row per region and a WKT
//! geometry column. A region is found by scanning raw lines for the first one
//! that contains the requested name as a substring, so "Rio" matches the first
//! row mentioning "Rio de Janeiro" (or "Rio Branco", whichever comes first).

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, MultiPolygon};

use crate::errors::AppError;
use crate::services::wkt::parse_wkt;

/// A resolved region boundary (longitude = x, latitude = y).
#[derive(Debug, Clone)]
pub struct RegionPolygon {
    /// Name that was searched for
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl RegionPolygon {
    /// Point-in-polygon test.
    ///
    /// Points on a ring boundary (outer ring or hole) count as inside; points in
    /// the interior of a hole are outside.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        let coord = Coord {
            x: longitude,
            y: latitude,
        };
        // Per member: a multi-geometry boundary drops points shared by two parts.
        self.geometry
            .0
            .iter()
            .any(|polygon| !matches!(polygon.coordinate_position(&coord), CoordPos::Outside))
    }

    /// Total number of rings, exterior and interior.
    pub fn ring_count(&self) -> usize {
        self.geometry
            .0
            .iter()
            .map(|p| 1 + p.interiors().len())
            .sum()
    }
}

/// First line of `table` containing `region_name`, header included.
pub fn find_region_row<'a>(table: &'a str, region_name: &str) -> Option<&'a str> {
    table.lines().find(|line| line.contains(region_name))
}

/// Resolve `region_name` to its boundary polygon.
///
/// The matched line is decoded as a single CSV row and the WKT in
/// `geometry_column` parsed into rings.
pub fn resolve_region(
    table: &str,
    region_name: &str,
    geometry_column: usize,
) -> Result<RegionPolygon, AppError> {
    let row = find_region_row(table, region_name)
        .ok_or_else(|| AppError::RegionNotFound(region_name.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(row.as_bytes());
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Err(AppError::InvalidRegionGeometry(format!(
            "row for '{}' is empty",
            region_name
        )));
    }

    let wkt = record.get(geometry_column).ok_or_else(|| {
        AppError::InvalidRegionGeometry(format!(
            "row for '{}' has {} columns, geometry expected in column {}",
            region_name,
            record.len(),
            geometry_column
        ))
    })?;

    let geometry = parse_wkt(wkt)?;
    let polygon = RegionPolygon {
        name: region_name.to_string(),
        geometry,
    };

    tracing::debug!(
        "Resolved region '{}' to {} polygon(s), {} ring(s)",
        region_name,
        polygon.geometry.0.len(),
        polygon.ring_count()
    );

    Ok(polygon)
}
