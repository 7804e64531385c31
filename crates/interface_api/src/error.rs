//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_audit::AuditError;
use domain_claims::InputShapeError;
use domain_reporting::ReportError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<InputShapeError> for ApiError {
    fn from(err: InputShapeError) -> Self {
        let details = match &err {
            InputShapeError::Rejected { errors } => errors.clone(),
            _ => Vec::new(),
        };
        ApiError::Validation {
            message: "Claim record rejected".to_string(),
            details: if details.is_empty() { vec![err.to_string()] } else { details },
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::InputShape(inner) => inner.into(),
            AuditError::UnknownDomain(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::UnknownFormat(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Failures while assembling the server from configuration
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Audit engine error: {0}")]
    Audit(#[from] AuditError),

    #[error("Report setup error: {0}")]
    Report(#[from] ReportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad = ApiError::from(AuditError::UnknownDomain("roofing".into())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let rejected = ApiError::from(InputShapeError::Rejected {
            errors: vec!["deductible must not be negative".into()],
        })
        .into_response();
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let format = ApiError::from(ReportError::UnknownFormat("pdf".into())).into_response();
        assert_eq!(format.status(), StatusCode::BAD_REQUEST);
    }
}
