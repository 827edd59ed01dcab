//! Weather HTTP endpoints.
//!
//! - GET /api/v1/weather/points?regionName=..&selectedDateTime=YYYY-MM-DDTHH:MM
//! - GET /api/getDataRegion (same handler, path used by the map client)
//! - GET /api/v1/weather/surface?regionName=..&selectedDateTime=..&field=sp&resolution=30

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::data::models::{ScalarField, WeatherSample};
use crate::data::sources::DatasetClient;
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::kelvin_to_celsius;
use crate::services::bands::{partition_into_bands, BandThresholds, BandedNodes};
use crate::services::grid::{interpolate, GridNode, GridOptions};
use crate::services::pipeline::{load_region_points, RegionQuery};

/// Upper bound for the `resolution` query parameter.
const MAX_GRID_RESOLUTION: usize = 500;

/// Pipeline settings fixed at startup.
#[derive(Debug, Clone)]
pub(crate) struct PipelineSettings {
    pub(crate) region_geometry_column: usize,
    pub(crate) grid_resolution: usize,
    pub(crate) bands: BandThresholds,
}

/// Shared application state for weather endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) datasets: DatasetClient,
    pub(crate) settings: PipelineSettings,
}

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RegionPointsQuery {
    /// Region name, matched as a substring of region dataset rows (e.g. "Rio de Janeiro")
    pub region_name: String,
    /// Target date-time as "YYYY-MM-DDTHH:MM" (e.g. "2022-10-05T00:00")
    pub selected_date_time: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceQuery {
    /// Region name, matched as a substring of region dataset rows
    pub region_name: String,
    /// Target date-time as "YYYY-MM-DDTHH:MM"
    pub selected_date_time: String,
    /// Scalar field to interpolate (default "sp", surface pressure)
    pub field: Option<ScalarField>,
    /// Grid subdivisions per axis (default from configuration)
    pub resolution: Option<usize>,
    /// Keep nodes whose value is undefined, serialized with `value: null` (default true)
    pub keep_invalid: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A filtered weather sample with derived display values.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherPoint {
    #[serde(flatten)]
    pub sample: WeatherSample,
    /// 2 m air temperature in Celsius (heatmap weight)
    pub temperature_c: f64,
}

impl From<WeatherSample> for WeatherPoint {
    fn from(sample: WeatherSample) -> Self {
        let temperature_c = kelvin_to_celsius(sample.t2m);
        Self {
            sample,
            temperature_c,
        }
    }
}

/// Filtered points for a region at one instant.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointsResponse {
    /// Points inside the region, one per coordinate, in dataset order
    pub points: Vec<WeatherPoint>,
}

/// Interpolated surface for a region at one instant.
#[derive(Debug, Serialize, ToSchema)]
pub struct SurfaceResponse {
    /// Region name as requested
    pub region_name: String,
    /// Interpolated field
    pub field: ScalarField,
    /// Subdivisions per axis used
    pub grid_resolution: usize,
    /// Number of filtered points the grid was built from
    pub point_count: usize,
    /// Number of grid nodes returned
    pub node_count: usize,
    /// Nodes with an undefined value (`value: null`)
    pub invalid_node_count: usize,
    /// Grid nodes, row-major (latitude outer, longitude inner)
    pub nodes: Vec<GridNode>,
    /// Valid nodes split into low / mid / high value bands
    pub bands: Vec<BandedNodes>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn region_query(region_name: &str, selected_date_time: &str) -> Result<RegionQuery, AppError> {
    // An empty name would match the first line of the region dataset.
    if region_name.trim().is_empty() {
        return Err(AppError::BadRequest("regionName must not be empty".to_string()));
    }
    Ok(RegionQuery {
        region_name: region_name.to_string(),
        selected_date_time: selected_date_time.to_string(),
    })
}

/// Get the weather points inside a region at a specific date-time.
///
/// Keeps records whose timestamp equals the selected instant, drops records
/// with invalid or duplicate coordinates, and keeps those inside the region
/// boundary (points on the boundary count as inside).
#[utoipa::path(
    get,
    path = "/api/v1/weather/points",
    tag = "Weather",
    params(RegionPointsQuery),
    responses(
        (status = 200, description = "Filtered weather points", body = PointsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 404, description = "Region not found", body = ErrorResponse),
        (status = 502, description = "Dataset retrieval failed", body = ErrorResponse),
    )
)]
pub async fn get_region_points(
    State(state): State<AppState>,
    Query(params): Query<RegionPointsQuery>,
) -> Result<Json<PointsResponse>, AppError> {
    tracing::info!("Fetching weather points for region: {}", params.region_name);
    let query = region_query(&params.region_name, &params.selected_date_time)?;

    let result = load_region_points(
        &state.datasets,
        &query,
        state.settings.region_geometry_column,
    )
    .await?;
    tracing::debug!(
        "Region '{}' ({} ring(s)) kept {} point(s)",
        result.region.name,
        result.region.ring_count(),
        result.report.retained
    );

    Ok(Json(PointsResponse {
        points: result.points.into_iter().map(WeatherPoint::from).collect(),
    }))
}

/// Get an interpolated surface grid for a region at a specific date-time.
///
/// Builds a regular grid over the bounding box of the filtered points. Each
/// node is the plain mean of the first point found in each of its four
/// lat/lon quadrants; nodes without four neighbours are omitted.
#[utoipa::path(
    get,
    path = "/api/v1/weather/surface",
    tag = "Weather",
    params(SurfaceQuery),
    responses(
        (status = 200, description = "Interpolated surface grid", body = SurfaceResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 404, description = "Region not found", body = ErrorResponse),
        (status = 502, description = "Dataset retrieval failed", body = ErrorResponse),
    )
)]
pub async fn get_region_surface(
    State(state): State<AppState>,
    Query(params): Query<SurfaceQuery>,
) -> Result<Json<SurfaceResponse>, AppError> {
    let resolution = params.resolution.unwrap_or(state.settings.grid_resolution);
    if resolution == 0 || resolution > MAX_GRID_RESOLUTION {
        return Err(AppError::BadRequest(format!(
            "resolution must be between 1 and {}",
            MAX_GRID_RESOLUTION
        )));
    }
    let query = region_query(&params.region_name, &params.selected_date_time)?;

    let options = GridOptions {
        resolution,
        field: params.field.unwrap_or_default(),
        keep_invalid: params.keep_invalid.unwrap_or(true),
    };

    let result = load_region_points(
        &state.datasets,
        &query,
        state.settings.region_geometry_column,
    )
    .await?;
    let point_count = result.points.len();

    let points = result.points;
    let nodes = tokio::task::spawn_blocking(move || interpolate(&points, &options))
        .await
        .map_err(|e| AppError::InternalError(format!("Interpolation task failed: {}", e)))?;

    let invalid_node_count = nodes.iter().filter(|n| !n.is_valid()).count();
    if invalid_node_count > 0 {
        tracing::warn!(
            "{} of {} grid nodes for '{}' have no value",
            invalid_node_count,
            nodes.len(),
            query.region_name
        );
    }
    let bands = partition_into_bands(&nodes, &state.settings.bands);

    Ok(Json(SurfaceResponse {
        region_name: query.region_name,
        field: options.field,
        grid_resolution: resolution,
        point_count,
        node_count: nodes.len(),
        invalid_node_count,
        nodes,
        bands,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sources::DatasetSource;
    use crate::services::bands::ValueBand;
    use std::path::PathBuf;

    const WEATHER_CSV: &str = "\
latitude,longitude,time,t2m,sp
0,0,2022-10-05 00:00:00,293.15,97000
0,1,2022-10-05 00:00:00,293.15,99000
1,0,2022-10-05 00:00:00,293.15,101000
1,1,2022-10-05 00:00:00,293.15,103000
1,1,2022-10-05 00:00:00,300.00,1
0.5,0.5,2022-10-05 01:00:00,293.15,50000
abc,0.5,2022-10-05 00:00:00,293.15,99000
7,7,2022-10-05 00:00:00,293.15,99000
";

    const REGIONS_CSV: &str = "\
id,name,state,code,area,geometry
1,Square Region,XX,1,1,\"POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))\"
";

    fn fixture_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "weather-region-routes-{}-{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("weather.csv"), WEATHER_CSV).unwrap();
        std::fs::write(dir.join("regions.csv"), REGIONS_CSV).unwrap();
        dir
    }

    fn state(tag: &str) -> AppState {
        let dir = fixture_dir(tag);
        AppState {
            datasets: DatasetClient::new(
                DatasetSource::File(dir.join("weather.csv")),
                DatasetSource::File(dir.join("regions.csv")),
            ),
            settings: PipelineSettings {
                region_geometry_column: 5,
                grid_resolution: 2,
                bands: BandThresholds::default(),
            },
        }
    }

    fn points_query(region: &str) -> RegionPointsQuery {
        RegionPointsQuery {
            region_name: region.to_string(),
            selected_date_time: "2022-10-05T00:00".to_string(),
        }
    }

    fn surface_query() -> SurfaceQuery {
        SurfaceQuery {
            region_name: "Square".to_string(),
            selected_date_time: "2022-10-05T00:00".to_string(),
            field: None,
            resolution: None,
            keep_invalid: None,
        }
    }

    #[tokio::test]
    async fn test_region_points() {
        let Json(resp) = get_region_points(State(state("points")), Query(points_query("Square")))
            .await
            .unwrap();

        assert_eq!(resp.points.len(), 4);
        assert_eq!(resp.points[3].sample.sp, 103000.0);
        assert!((resp.points[0].temperature_c - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_region_points_json_shape() {
        let Json(resp) = get_region_points(State(state("shape")), Query(points_query("Square")))
            .await
            .unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        let first = &json["points"][0];
        assert_eq!(first["latitude"], 0.0);
        assert_eq!(first["timestamp"], "2022-10-05 00:00:00");
        assert!(first["d2m"].is_null());
        assert!(first.get("temperature_c").is_some());
    }

    #[tokio::test]
    async fn test_region_not_found() {
        let err = get_region_points(State(state("missing")), Query(points_query("Atlantis")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RegionNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_region_name_rejected() {
        let err = get_region_points(State(state("empty")), Query(points_query("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_surface() {
        let Json(resp) = get_region_surface(State(state("surface")), Query(surface_query()))
            .await
            .unwrap();

        assert_eq!(resp.field, ScalarField::Sp);
        assert_eq!(resp.grid_resolution, 2);
        assert_eq!(resp.point_count, 4);
        assert_eq!(resp.node_count, 4);
        assert_eq!(resp.invalid_node_count, 0);
        // (97000 + 99000 + 101000 + 103000) / 4
        assert!(resp.nodes.iter().all(|n| n.value == 100_000.0));

        assert_eq!(resp.bands.len(), 3);
        assert_eq!(resp.bands[1].band, ValueBand::Mid);
        assert_eq!(resp.bands[1].nodes.len(), 4);
    }

    #[tokio::test]
    async fn test_surface_missing_field_values_are_invalid() {
        let params = SurfaceQuery {
            field: Some(ScalarField::Tcc),
            ..surface_query()
        };
        let Json(resp) = get_region_surface(State(state("tcc")), Query(params))
            .await
            .unwrap();
        assert_eq!(resp.node_count, 4);
        assert_eq!(resp.invalid_node_count, 4);
        assert!(resp.bands.iter().all(|b| b.nodes.is_empty()));

        let params = SurfaceQuery {
            field: Some(ScalarField::Tcc),
            keep_invalid: Some(false),
            ..surface_query()
        };
        let Json(resp) = get_region_surface(State(state("tcc-drop")), Query(params))
            .await
            .unwrap();
        assert_eq!(resp.node_count, 0);
    }

    #[tokio::test]
    async fn test_surface_resolution_validation() {
        for resolution in [0, MAX_GRID_RESOLUTION + 1] {
            let params = SurfaceQuery {
                resolution: Some(resolution),
                ..surface_query()
            };
            let err = get_region_surface(State(state("res")), Query(params))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[test]
    fn test_surface_query_parsing() {
        let params: SurfaceQuery = serde_json::from_value(serde_json::json!({
            "regionName": "Rio",
            "selectedDateTime": "2022-10-05T00:00",
            "field": "t2m",
            "resolution": 40
        }))
        .unwrap();
        assert_eq!(params.field, Some(ScalarField::T2m));
        assert_eq!(params.resolution, Some(40));
        assert_eq!(params.keep_invalid, None);
    }
}
