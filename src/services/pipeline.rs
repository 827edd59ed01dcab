//! Request pipeline: datasets → temporal filter → spatial filter.
//!
//! The temporal filter runs before deduplication, so only records at the
//! requested instant compete for a coordinate.

use crate::data::models::{WeatherRecord, WeatherSample};
use crate::data::sources::DatasetClient;
use crate::errors::AppError;
use crate::services::region::{resolve_region, RegionPolygon};
use crate::services::spatial::{filter_within_region, FilterReport};
use crate::services::temporal::{filter_by_date_time, normalize_date_time};

/// One region/time query.
#[derive(Debug, Clone)]
pub struct RegionQuery {
    /// Substring matched against region dataset rows
    pub region_name: String,
    /// "YYYY-MM-DDTHH:MM"
    pub selected_date_time: String,
}

/// Filtered points for a query, with the resolved region.
#[derive(Debug, Clone)]
pub struct RegionPoints {
    pub region: RegionPolygon,
    pub points: Vec<WeatherSample>,
    pub report: FilterReport,
}

/// Keep records at `selected_date_time` that lie inside `region`, one per
/// coordinate.
pub fn points_within_region(
    records: &[WeatherRecord],
    region: &RegionPolygon,
    selected_date_time: &str,
) -> (Vec<WeatherSample>, FilterReport) {
    let target = normalize_date_time(selected_date_time);
    match target.as_deref() {
        Some(t) => tracing::debug!("Target DateTime: {}", t),
        None => tracing::warn!(
            "Selected date-time '{}' has no 'T' separator, nothing will match",
            selected_date_time
        ),
    }

    let in_time = filter_by_date_time(records, target.as_deref());
    let date_time_mismatch = records.len() - in_time.len();

    let (points, mut report) = filter_within_region(in_time.iter().copied(), region);
    report.date_time_mismatch = date_time_mismatch;
    (points, report)
}

/// Fetch both datasets, resolve the region and filter.
pub async fn load_region_points(
    datasets: &DatasetClient,
    query: &RegionQuery,
    geometry_column: usize,
) -> Result<RegionPoints, AppError> {
    let (records, region_table) = futures::try_join!(
        datasets.fetch_weather_records(),
        datasets.fetch_region_table()
    )?;

    let region = resolve_region(&region_table, &query.region_name, geometry_column)?;
    let (points, report) = points_within_region(&records, &region, &query.selected_date_time);

    tracing::info!(
        "Region '{}' at {}: {} of {} records kept ({:?})",
        query.region_name,
        query.selected_date_time,
        points.len(),
        records.len(),
        report
    );

    Ok(RegionPoints {
        region,
        points,
        report,
    })
}
