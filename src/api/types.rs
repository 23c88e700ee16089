//! API request, response, and error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ServiceError;

/// Error response body for every non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `POST /optimize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
}

/// Query string of `GET /predictions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionsQuery {
    pub building_id: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// A service error bound to the operation that raised it.
///
/// Storage failures are reported with the operation's generic message and
/// logged in full; validation and not-found errors pass their message through.
#[derive(Debug)]
pub struct ApiError {
    pub operation: &'static str,
    pub source: ServiceError,
}

impl ApiError {
    pub fn new(operation: &'static str, source: ServiceError) -> Self {
        Self { operation, source }
    }

    fn status(&self) -> StatusCode {
        match self.source {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.source {
            ServiceError::Validation(msg) => msg.clone(),
            ServiceError::NotFound(_) => self.source.to_string(),
            ServiceError::Storage(err) => {
                error!(operation = self.operation, error = %err, "Storage failure");
                self.operation.to_string()
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
