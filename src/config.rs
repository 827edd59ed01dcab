/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// File path or http(s) URL of the weather CSV.
    pub weather_data_source: String,
    /// File path or http(s) URL of the region CSV.
    pub region_data_source: String,
    /// Zero-based column of the region CSV holding the WKT geometry.
    pub region_geometry_column: usize,
    /// Default number of grid subdivisions per axis for surface interpolation.
    pub grid_resolution: usize,
    /// Upper bound (inclusive) of the "low" value band.
    pub band_low_max: f64,
    /// Upper bound (inclusive) of the "mid" value band.
    pub band_mid_max: f64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            weather_data_source: std::env::var("WEATHER_DATA_SOURCE")
                .expect("WEATHER_DATA_SOURCE must be set"),
            region_data_source: std::env::var("REGION_DATA_SOURCE")
                .expect("REGION_DATA_SOURCE must be set"),
            region_geometry_column: std::env::var("REGION_GEOMETRY_COLUMN")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("REGION_GEOMETRY_COLUMN must be a valid column index"),
            grid_resolution: std::env::var("GRID_RESOLUTION")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("GRID_RESOLUTION must be a positive integer"),
            band_low_max: std::env::var("BAND_LOW_MAX")
                .unwrap_or_else(|_| "98000".to_string())
                .parse()
                .expect("BAND_LOW_MAX must be a number"),
            band_mid_max: std::env::var("BAND_MID_MAX")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()
                .expect("BAND_MID_MAX must be a number"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
        }
    }
}
