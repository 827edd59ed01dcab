// Weather Region API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod data;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use data::sources::{DatasetClient, DatasetSource};
use routes::weather::{AppState, PipelineSettings};
use services::bands::BandThresholds;

/// Weather Region API — OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Region API",
        version = "0.1.0",
        description = "Serves gridded weather observations clipped to an administrative \
            region at a single instant. Filters a weather CSV dataset by date-time and \
            by containment in a WKT region boundary, and interpolates the retained \
            points onto a regular grid split into value bands for contour rendering.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Region-filtered weather points and surfaces"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_region_points,
        routes::weather::get_region_surface,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            data::models::WeatherSample,
            data::models::ScalarField,
            routes::weather::WeatherPoint,
            routes::weather::PointsResponse,
            routes::weather::SurfaceResponse,
            services::grid::GridNode,
            services::bands::ValueBand,
            services::bands::BandedNodes,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_region_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let weather_source = DatasetSource::parse(&config.weather_data_source);
    let region_source = DatasetSource::parse(&config.region_data_source);
    tracing::info!("Weather dataset: {}", weather_source);
    tracing::info!("Region dataset: {}", region_source);

    let app_state = AppState {
        datasets: DatasetClient::new(weather_source, region_source),
        settings: PipelineSettings {
            region_geometry_column: config.region_geometry_column,
            grid_resolution: config.grid_resolution,
            bands: BandThresholds {
                low_max: config.band_low_max,
                mid_max: config.band_mid_max,
            },
        },
    };

    // CORS — read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let health_routes = Router::new().route("/api/v1/health", get(routes::health::health_check));

    // The map client still calls /api/getDataRegion; it shares the points handler.
    let weather_routes = Router::new()
        .route(
            "/api/v1/weather/points",
            get(routes::weather::get_region_points),
        )
        .route(
            "/api/getDataRegion",
            get(routes::weather::get_region_points),
        )
        .route(
            "/api/v1/weather/surface",
            get(routes::weather::get_region_surface),
        )
        .with_state(app_state);

    let app = Router::new()
        .merge(health_routes)
        .merge(weather_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
