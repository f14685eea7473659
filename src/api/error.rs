//! HTTP error responses

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::VitalAirError;
use crate::forecast::QueryError;

/// API error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Known locations, when the requested one was not found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_locations: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            available_locations: None,
        }
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub enum AppError {
    Query(QueryError),
    BadRequest(String),
    /// Forecast data could not be loaded
    Unavailable(VitalAirError),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::Query(err)
    }
}

impl From<VitalAirError> for AppError {
    fn from(err: VitalAirError) -> Self {
        match err {
            VitalAirError::Query(err) => AppError::Query(err),
            other => AppError::Unavailable(other),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Query(err) => {
                let status = match err {
                    QueryError::BadFormat | QueryError::BadDate { .. } => StatusCode::BAD_REQUEST,
                    QueryError::LocationNotFound { .. } | QueryError::NoDataForDate { .. } => {
                        StatusCode::NOT_FOUND
                    }
                };
                let mut body = ApiError::new(err.code(), err.to_string());
                if let QueryError::LocationNotFound { available, .. } = err {
                    body.available_locations = Some(available);
                }
                (status, body)
            }
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", message))
            }
            AppError::Unavailable(err) => {
                warn!("Forecast data unavailable: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new("DATA_UNAVAILABLE", err.user_message()),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
