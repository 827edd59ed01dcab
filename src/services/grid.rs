//! Surface grid interpolation.
//!
//! Builds a regular lon/lat grid over the bounding box of the filtered points
//! and assigns each node the mean of four "quadrant neighbours":
//!
//! - neighbours are the *first* points in source order falling in each of the
//!   four quadrants around the node, not the nearest ones
//! - the value is the plain average of the four, the normalized offsets inside
//!   the neighbour box are computed but not applied as weights

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::data::models::{ScalarField, WeatherSample};
use crate::helpers::finite_mean;

/// Default number of subdivisions per axis.
pub const DEFAULT_GRID_RESOLUTION: usize = 30;

/// Options for one interpolation run.
#[derive(Debug, Clone, Copy)]
pub struct GridOptions {
    /// Subdivisions per axis
    pub resolution: usize,
    /// Scalar field averaged at each node
    pub field: ScalarField,
    /// Keep nodes whose value is NaN (a neighbour had no finite value)
    pub keep_invalid: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_GRID_RESOLUTION,
            field: ScalarField::default(),
            keep_invalid: true,
        }
    }
}

/// One interpolated grid node. `value` is NaN (serialized as `null`) when
/// undefined.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GridNode {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl GridNode {
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }
}

/// Why a cell has no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InterpolationUndefined {
    #[error("fewer than four quadrant neighbours")]
    MissingQuadrant,
    #[error("a quadrant neighbour has no finite value")]
    NonFiniteValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Bounding box of `points`, `None` when empty.
    pub fn of(points: &[WeatherSample]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.latitude),
            max_lat: b.max_lat.max(p.latitude),
            min_lon: b.min_lon.min(p.longitude),
            max_lon: b.max_lon.max(p.longitude),
        }))
    }
}

/// The four neighbours of a target coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Quadrants<'a> {
    /// lat <= target, lon <= target
    pub lower_left: &'a WeatherSample,
    /// lat <= target, lon > target
    pub lower_right: &'a WeatherSample,
    /// lat > target, lon <= target
    pub upper_left: &'a WeatherSample,
    /// lat > target, lon > target
    pub upper_right: &'a WeatherSample,
}

impl<'a> Quadrants<'a> {
    /// Normalized (x, y) position of the target relative to the neighbours.
    /// May be non-finite when neighbours share an ordinate.
    pub fn offsets(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let ll = self.lower_left;
        let x = (longitude - ll.longitude) / (self.upper_left.longitude - ll.longitude);
        let y = (latitude - ll.latitude) / (self.lower_right.latitude - ll.latitude);
        (x, y)
    }

    pub fn values(&self, field: ScalarField) -> [f64; 4] {
        [
            self.lower_left.value(field),
            self.lower_right.value(field),
            self.upper_left.value(field),
            self.upper_right.value(field),
        ]
    }
}

/// First point in source order for each quadrant around (latitude, longitude).
///
/// Stops scanning once all four are filled; `None` if any quadrant stays empty.
pub fn find_quadrant_neighbors(
    latitude: f64,
    longitude: f64,
    points: &[WeatherSample],
) -> Option<Quadrants<'_>> {
    let mut lower_left = None;
    let mut lower_right = None;
    let mut upper_left = None;
    let mut upper_right = None;

    for p in points {
        let slot = match (p.latitude <= latitude, p.longitude <= longitude) {
            (true, true) => &mut lower_left,
            (true, false) => &mut lower_right,
            (false, true) => &mut upper_left,
            (false, false) => &mut upper_right,
        };
        if slot.is_none() {
            *slot = Some(p);
        }
        if lower_left.is_some()
            && lower_right.is_some()
            && upper_left.is_some()
            && upper_right.is_some()
        {
            break;
        }
    }

    Some(Quadrants {
        lower_left: lower_left?,
        lower_right: lower_right?,
        upper_left: upper_left?,
        upper_right: upper_right?,
    })
}

/// Interpolate one cell.
///
/// `Err(NonFiniteValue)` still describes a located cell; the caller decides
/// whether to keep it as a NaN node.
pub fn interpolate_cell(
    latitude: f64,
    longitude: f64,
    points: &[WeatherSample],
    field: ScalarField,
) -> Result<GridNode, InterpolationUndefined> {
    let quadrants = find_quadrant_neighbors(latitude, longitude, points)
        .ok_or(InterpolationUndefined::MissingQuadrant)?;

    let (x, y) = quadrants.offsets(latitude, longitude);
    tracing::trace!(
        "Cell ({}, {}) offsets x={} y={} (unweighted mean)",
        latitude,
        longitude,
        x,
        y
    );

    let value = finite_mean(&quadrants.values(field));
    if value.is_nan() {
        return Err(InterpolationUndefined::NonFiniteValue);
    }

    Ok(GridNode {
        latitude,
        longitude,
        value,
    })
}

/// Candidate positions from `min` to `max` inclusive, accumulating `step`.
fn axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut v = min;
    while v <= max {
        values.push(v);
        let next = v + step;
        if next <= v {
            // step below float resolution at this magnitude
            break;
        }
        v = next;
    }
    values
}

/// Interpolate a grid over `points`.
///
/// Nodes come out row-major (latitude outer, longitude inner). No nodes are
/// produced when the bounding box is degenerate on either axis.
pub fn interpolate(points: &[WeatherSample], options: &GridOptions) -> Vec<GridNode> {
    let Some(bbox) = BoundingBox::of(points) else {
        return Vec::new();
    };
    if options.resolution == 0 {
        return Vec::new();
    }

    let lat_step = (bbox.max_lat - bbox.min_lat) / options.resolution as f64;
    let lon_step = (bbox.max_lon - bbox.min_lon) / options.resolution as f64;
    if !(lat_step > 0.0 && lon_step > 0.0) {
        tracing::warn!(
            "Grid undefined for {} point(s): degenerate bounding box {:?}",
            points.len(),
            bbox
        );
        return Vec::new();
    }

    let lats = axis(bbox.min_lat, bbox.max_lat, lat_step);
    let lons = axis(bbox.min_lon, bbox.max_lon, lon_step);
    let cells: Vec<(f64, f64)> = lats
        .iter()
        .flat_map(|&lat| lons.iter().map(move |&lon| (lat, lon)))
        .collect();

    let field = options.field;
    let keep_invalid = options.keep_invalid;
    let nodes: Vec<GridNode> = cells
        .par_iter()
        .filter_map(
            |&(lat, lon)| match interpolate_cell(lat, lon, points, field) {
                Ok(node) => Some(node),
                Err(InterpolationUndefined::MissingQuadrant) => None,
                Err(InterpolationUndefined::NonFiniteValue) => {
                    tracing::debug!("Interpolation produced NaN for ({}, {})", lat, lon);
                    keep_invalid.then_some(GridNode {
                        latitude: lat,
                        longitude: lon,
                        value: f64::NAN,
                    })
                }
            },
        )
        .collect();

    tracing::debug!(
        "Interpolated {} node(s) from {} candidate cell(s) over {} point(s)",
        nodes.len(),
        cells.len(),
        points.len()
    );

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64, sp: f64) -> WeatherSample {
        WeatherSample {
            latitude: lat,
            longitude: lon,
            timestamp: "2022-10-05 00:00:00".to_string(),
            t2m: f64::NAN,
            d2m: f64::NAN,
            sp,
            tcc: f64::NAN,
            u10: f64::NAN,
            u100: f64::NAN,
            v10: f64::NAN,
            v100: f64::NAN,
        }
    }

    fn corners() -> Vec<WeatherSample> {
        vec![
            sample(0.0, 0.0, 10.0),
            sample(0.0, 1.0, 20.0),
            sample(1.0, 0.0, 30.0),
            sample(1.0, 1.0, 40.0),
        ]
    }

    #[test]
    fn test_mean_regardless_of_position() {
        let points = corners();
        for &(lat, lon) in &[(0.5, 0.5), (0.1, 0.9), (0.9, 0.1), (0.0, 0.0), (0.99, 0.01)] {
            let node = interpolate_cell(lat, lon, &points, ScalarField::Sp).unwrap();
            assert_eq!(node.value, 25.0, "at ({}, {})", lat, lon);
        }
    }

    #[test]
    fn test_quadrant_assignment() {
        let points = corners();
        let q = find_quadrant_neighbors(0.5, 0.5, &points).unwrap();
        assert_eq!(q.lower_left.sp, 10.0);
        assert_eq!(q.lower_right.sp, 20.0);
        assert_eq!(q.upper_left.sp, 30.0);
        assert_eq!(q.upper_right.sp, 40.0);
    }

    #[test]
    fn test_first_match_not_nearest() {
        let mut points = corners();
        // Closer to the target but later in source order
        points.push(sample(0.49, 0.49, 1000.0));
        let q = find_quadrant_neighbors(0.5, 0.5, &points).unwrap();
        assert_eq!(q.lower_left.sp, 10.0);

        let mut reordered = vec![sample(0.49, 0.49, 1000.0)];
        reordered.extend(corners());
        let q = find_quadrant_neighbors(0.5, 0.5, &reordered).unwrap();
        assert_eq!(q.lower_left.sp, 1000.0);
    }

    #[test]
    fn test_offsets_computed() {
        let points = corners();
        let q = find_quadrant_neighbors(0.25, 0.5, &points).unwrap();
        let (x, y) = q.offsets(0.25, 0.5);
        // upper_left shares the lower-left longitude, lower_right its latitude
        assert!(!x.is_finite());
        assert!(!y.is_finite());
    }

    #[test]
    fn test_missing_quadrant_skipped() {
        let points = vec![sample(0.0, 0.0, 1.0), sample(1.0, 1.0, 2.0)];
        assert_eq!(
            interpolate_cell(0.5, 0.5, &points, ScalarField::Sp),
            Err(InterpolationUndefined::MissingQuadrant)
        );
    }

    #[test]
    fn test_nan_neighbour() {
        let mut points = corners();
        points[2].sp = f64::NAN;
        assert_eq!(
            interpolate_cell(0.5, 0.5, &points, ScalarField::Sp),
            Err(InterpolationUndefined::NonFiniteValue)
        );
    }

    #[test]
    fn test_grid_over_corners() {
        let options = GridOptions {
            resolution: 2,
            ..Default::default()
        };
        let nodes = interpolate(&corners(), &options);

        let positions: Vec<(f64, f64)> = nodes.iter().map(|n| (n.latitude, n.longitude)).collect();
        assert_eq!(positions, vec![(0.0, 0.0), (0.0, 0.5), (0.5, 0.0), (0.5, 0.5)]);
        assert!(nodes.iter().all(|n| n.value == 25.0));
    }

    #[test]
    fn test_invalid_nodes_kept_or_dropped() {
        let mut points = corners();
        points[0].sp = f64::NAN;

        let kept = interpolate(
            &points,
            &GridOptions {
                resolution: 2,
                ..Default::default()
            },
        );
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|n| !n.is_valid()));

        let dropped = interpolate(
            &points,
            &GridOptions {
                resolution: 2,
                keep_invalid: false,
                ..Default::default()
            },
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_selected_field() {
        let mut points = corners();
        for (i, p) in points.iter_mut().enumerate() {
            p.t2m = 280.0 + i as f64;
        }
        let options = GridOptions {
            resolution: 2,
            field: ScalarField::T2m,
            ..Default::default()
        };
        let nodes = interpolate(&points, &options);
        assert!(nodes.iter().all(|n| n.value == 281.5));
    }

    #[test]
    fn test_deterministic() {
        let points: Vec<WeatherSample> = (0..60)
            .map(|i| {
                let lat = ((i * 37) % 17) as f64 * 0.13 - 23.0;
                let lon = ((i * 53) % 19) as f64 * 0.11 - 43.8;
                sample(lat, lon, 100_000.0 + (i * 31 % 400) as f64)
            })
            .collect();
        let options = GridOptions::default();

        let first = interpolate(&points, &options);
        let second = interpolate(&points, &options);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(interpolate(&[], &GridOptions::default()).is_empty());

        let same_lat = vec![sample(1.0, 0.0, 1.0), sample(1.0, 1.0, 2.0)];
        assert!(interpolate(&same_lat, &GridOptions::default()).is_empty());

        let zero_resolution = GridOptions {
            resolution: 0,
            ..Default::default()
        };
        assert!(interpolate(&corners(), &zero_resolution).is_empty());
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::of(&corners()).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                min_lat: 0.0,
                max_lat: 1.0,
                min_lon: 0.0,
                max_lon: 1.0
            }
        );
        assert!(BoundingBox::of(&[]).is_none());
    }

    #[test]
    fn test_axis_accumulates() {
        assert_eq!(axis(0.0, 1.0, 0.5), vec![0.0, 0.5, 1.0]);
        assert_eq!(axis(0.0, 1.0, 2.0), vec![0.0]);
    }
}
