//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::allocation::ClaimError;
use crate::db::DatabaseError;
use crate::dispensing::DispenseError;
use crate::error::WorkflowError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown or inactive user")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNKNOWN_USER",
                "A valid X-Bhw-Id header is required".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} was not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            WorkflowError::InvalidTransition { .. } | WorkflowError::NotApproved(_) => {
                ApiError::Conflict(err.to_string())
            }
            WorkflowError::OutOfScope(_) | WorkflowError::Forbidden(_) => {
                ApiError::Forbidden(err.to_string())
            }
            WorkflowError::Validation(msg) => ApiError::BadRequest(msg),
            WorkflowError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<DispenseError> for ApiError {
    fn from(err: DispenseError) -> Self {
        match err {
            DispenseError::NotOnDuty => ApiError::Forbidden(err.to_string()),
            DispenseError::RequestNotFound(_) | DispenseError::BatchNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            DispenseError::InvalidQuantity(_)
            | DispenseError::QuantityExceedsRequest { .. }
            | DispenseError::BatchMedicineMismatch { .. }
            | DispenseError::BatchExpired { .. } => ApiError::BadRequest(err.to_string()),
            DispenseError::RequestNotReady { .. } | DispenseError::InsufficientStock { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DispenseError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::AlreadyClaimed { .. } => ApiError::Conflict(err.to_string()),
            ClaimError::NotSenior { .. }
            | ClaimError::NotCovered
            | ClaimError::ProgramNotRunning(_) => ApiError::BadRequest(err.to_string()),
            ClaimError::Workflow(e) => ApiError::from(e),
            ClaimError::Dispense(e) => ApiError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    use crate::models::enums::RequestStatus;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UNKNOWN_USER");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = ApiError::Internal("disk I/O error at page 7".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn dispense_errors_keep_flash_message() {
        let response = ApiError::from(DispenseError::NotOnDuty).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "You are not scheduled for duty today and cannot dispense medicine"
        );
    }

    #[test]
    fn status_mapping() {
        let conflict = ApiError::from(DispenseError::InsufficientStock {
            available: 1,
            requested: 5,
        });
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let not_found = ApiError::from(DispenseError::RequestNotFound(Uuid::nil()));
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let transition = ApiError::from(WorkflowError::InvalidTransition {
            from: RequestStatus::Dispensed,
            to: RequestStatus::Approved,
        });
        assert!(matches!(transition, ApiError::Conflict(_)));

        let scope = ApiError::from(WorkflowError::OutOfScope("Resident"));
        assert!(matches!(scope, ApiError::Forbidden(_)));

        let invalid = ApiError::from(WorkflowError::Validation("bad".into()));
        assert!(matches!(invalid, ApiError::BadRequest(m) if m == "bad"));

        let db = ApiError::from(DatabaseError::InvalidValue("x".into()));
        assert!(matches!(db, ApiError::Internal(_)));
    }
}
