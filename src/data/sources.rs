//! Dataset retrieval.
//!
//! The weather and region datasets are plain CSV files served either from the
//! local filesystem or over HTTP(S) (e.g. a blob-storage URL). Every request
//! fetches both in full; nothing is cached between requests.

use std::fmt;
use std::path::PathBuf;

use crate::data::models::WeatherRecord;
use crate::errors::AppError;

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Http(String),
}

impl DatasetSource {
    /// `http://` and `https://` locations are fetched over HTTP, anything else
    /// is treated as a file path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DatasetSource::Http(location.to_string())
        } else {
            DatasetSource::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Client for the weather and region datasets.
#[derive(Debug, Clone)]
pub struct DatasetClient {
    client: reqwest::Client,
    weather: DatasetSource,
    regions: DatasetSource,
}

impl DatasetClient {
    pub fn new(weather: DatasetSource, regions: DatasetSource) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            weather,
            regions,
        }
    }

    /// Fetch and decode every record of the weather dataset.
    pub async fn fetch_weather_records(&self) -> Result<Vec<WeatherRecord>, AppError> {
        let text = self.fetch_text(&self.weather).await?;
        let records = decode_weather_csv(&text)?;
        tracing::debug!("Loaded {} weather records from {}", records.len(), self.weather);
        Ok(records)
    }

    /// Fetch the region dataset as raw text; rows are scanned line by line.
    pub async fn fetch_region_table(&self) -> Result<String, AppError> {
        self.fetch_text(&self.regions).await
    }

    async fn fetch_text(&self, source: &DatasetSource) -> Result<String, AppError> {
        match source {
            DatasetSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::UpstreamRetrieval(format!("Failed to read {}: {}", path.display(), e))
            }),
            DatasetSource::Http(url) => {
                let response = self.client.get(url).send().await.map_err(|e| {
                    AppError::UpstreamRetrieval(format!("Request to {} failed: {}", url, e))
                })?;

                if !response.status().is_success() {
                    return Err(AppError::UpstreamRetrieval(format!(
                        "{} returned HTTP {}",
                        url,
                        response.status()
                    )));
                }

                response.text().await.map_err(|e| {
                    AppError::UpstreamRetrieval(format!("Failed to read body of {}: {}", url, e))
                })
            }
        }
    }
}

/// Decode weather CSV text (header row required) into raw records.
///
/// Rows shorter than the header are accepted with the missing columns empty.
/// Rows that fail to decode are skipped with a warning.
pub fn decode_weather_csv(text: &str) -> Result<Vec<WeatherRecord>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    // Surface a broken header as a dataset-level failure.
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let decoded = result.and_then(|mut record| {
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.deserialize::<WeatherRecord>(Some(&headers))
        });
        match decoded {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping undecodable weather row {}: {}", row + 1, e),
        }
    }
    Ok(records)
}
