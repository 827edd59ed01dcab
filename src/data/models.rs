use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::helpers::{parse_finite, parse_or_nan};

/// One raw row of the weather CSV, every column still a string.
///
/// Columns absent from the file decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherRecord {
    pub latitude: String,
    pub longitude: String,
    /// Sample instant, "YYYY-MM-DD HH:MM:SS"
    pub time: String,
    pub t2m: String,
    pub d2m: String,
    pub sp: String,
    pub tcc: String,
    pub u10: String,
    pub u100: String,
    pub v10: String,
    pub v100: String,
}

/// Why a record could not become a `WeatherSample`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("invalid longitude '{0}'")]
    Longitude(String),
    #[error("invalid latitude '{0}'")]
    Latitude(String),
}

/// A parsed weather sample.
///
/// Coordinates are always finite. Scalar fields are NaN when the source value
/// did not parse; NaN serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherSample {
    /// Latitude (WGS84)
    pub latitude: f64,
    /// Longitude (WGS84)
    pub longitude: f64,
    /// Sample instant, "YYYY-MM-DD HH:MM:SS"
    pub timestamp: String,
    /// 2 m air temperature in Kelvin
    pub t2m: f64,
    /// 2 m dew point temperature in Kelvin
    pub d2m: f64,
    /// Surface pressure in Pascal
    pub sp: f64,
    /// Total cloud cover fraction (0-1)
    pub tcc: f64,
    /// Eastward wind at 10 m in m/s
    pub u10: f64,
    /// Eastward wind at 100 m in m/s
    pub u100: f64,
    /// Northward wind at 10 m in m/s
    pub v10: f64,
    /// Northward wind at 100 m in m/s
    pub v100: f64,
}

impl WeatherSample {
    pub fn from_record(record: &WeatherRecord) -> Result<Self, CoordinateError> {
        let longitude = parse_finite(&record.longitude)
            .ok_or_else(|| CoordinateError::Longitude(record.longitude.clone()))?;
        let latitude = parse_finite(&record.latitude)
            .ok_or_else(|| CoordinateError::Latitude(record.latitude.clone()))?;

        Ok(Self {
            latitude,
            longitude,
            timestamp: record.time.clone(),
            t2m: parse_or_nan(&record.t2m),
            d2m: parse_or_nan(&record.d2m),
            sp: parse_or_nan(&record.sp),
            tcc: parse_or_nan(&record.tcc),
            u10: parse_or_nan(&record.u10),
            u100: parse_or_nan(&record.u100),
            v10: parse_or_nan(&record.v10),
            v100: parse_or_nan(&record.v100),
        })
    }

    /// Value of the given scalar field.
    pub fn value(&self, field: ScalarField) -> f64 {
        match field {
            ScalarField::T2m => self.t2m,
            ScalarField::D2m => self.d2m,
            ScalarField::Sp => self.sp,
            ScalarField::Tcc => self.tcc,
            ScalarField::U10 => self.u10,
            ScalarField::U100 => self.u100,
            ScalarField::V10 => self.v10,
            ScalarField::V100 => self.v100,
        }
    }
}

/// Scalar weather field selectable for surface interpolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScalarField {
    T2m,
    D2m,
    #[default]
    Sp,
    Tcc,
    U10,
    U100,
    V10,
    V100,
}
