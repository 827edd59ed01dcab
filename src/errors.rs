use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream retrieval error: {0}")]
    UpstreamRetrieval(String),

    #[error("Invalid region geometry: {0}")]
    InvalidRegionGeometry(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::RegionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamRetrieval(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRegionGeometry(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        (
            status,
            axum::Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<crate::services::wkt::WktError> for AppError {
    fn from(err: crate::services::wkt::WktError) -> Self {
        AppError::InvalidRegionGeometry(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::UpstreamRetrieval(format!("CSV decoding error: {}", err))
    }
}
