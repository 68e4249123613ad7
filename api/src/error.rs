use authz::{Denial, UNAUTHORIZED_PROBLEM_TYPE, UNAUTHORIZED_TITLE};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access to resource")]
    Unauthorized,
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Problem details body returned for every denied request
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
}

impl ProblemDetails {
    pub fn unauthorized() -> Self {
        Self {
            problem_type: UNAUTHORIZED_PROBLEM_TYPE.to_string(),
            title: UNAUTHORIZED_TITLE.to_string(),
            status: StatusCode::UNAUTHORIZED.as_u16(),
        }
    }
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Unauthorized = self {
            return (
                status,
                [(header::CONTENT_TYPE, "application/problem+json")],
                Json(ProblemDetails::unauthorized()),
            )
                .into_response();
        }

        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Every denial renders the same way, whatever its reason
impl From<Denial> for ApiError {
    fn from(_: Denial) -> Self {
        ApiError::Unauthorized
    }
}

/// Convert database errors to API errors
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::PublisherNotFound(id) => {
                ApiError::NotFound(format!("Publisher {} not found", id))
            }
            DatabaseError::Validation(message) => ApiError::ValidationError(message),
            other => {
                error!("Database error: {}", other);
                ApiError::DatabaseError(other.to_string())
            }
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_unauthorized_renders_problem_details() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let problem: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem["type"], UNAUTHORIZED_PROBLEM_TYPE);
        assert_eq!(problem["title"], "Unauthorized access to resource");
        assert_eq!(problem["status"], 401);
    }

    #[test]
    fn test_database_error_mapping() {
        let err: ApiError = DatabaseError::PublisherNotFound("p1".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = DatabaseError::Validation("Book title cannot be empty".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: ApiError = DatabaseError::Other("disk full".into()).into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
