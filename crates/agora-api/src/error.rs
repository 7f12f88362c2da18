//! API error types with proper HTTP mapping

use agora_debate::DebateError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::sanitize::SanitizeError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Debate has already been judged")]
    AlreadyJudged,

    #[error("Duplicate vote from {0}")]
    DuplicateVote(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidTransition(_)
            | ApiError::AlreadyJudged
            | ApiError::DuplicateVote(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::GenerationFailed(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InvalidTransition(_) => "INVALID_TRANSITION",
            ApiError::AlreadyJudged => "ALREADY_JUDGED",
            ApiError::DuplicateVote(_) => "DUPLICATE_VOTE",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::GenerationFailed(_) => "GENERATION_FAILED",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (message, details) = match self {
            ApiError::Internal(msg) => {
                // Don't expose internal errors to clients
                tracing::error!(error = %msg, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::AlreadyJudged => ("Debate has already been judged".to_string(), None),
            ApiError::DuplicateVote(voter_id) => (
                "This voter has already voted in this debate".to_string(),
                Some(json!({ "voter_id": voter_id })),
            ),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::InvalidTransition(msg)
            | ApiError::Validation(msg)
            | ApiError::GenerationFailed(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DebateError> for ApiError {
    fn from(e: DebateError) -> Self {
        match e {
            DebateError::NotFound { kind, id } => {
                ApiError::NotFound(format!("{} '{}' not found", kind, id))
            }
            DebateError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            DebateError::AlreadyJudged => ApiError::AlreadyJudged,
            DebateError::Validation(msg) => ApiError::Validation(msg),
            DebateError::DuplicateVote { voter_id } => ApiError::DuplicateVote(voter_id),
            DebateError::GenerationFailure(msg) => ApiError::GenerationFailed(msg),
            DebateError::Storage(e) => ApiError::Internal(format!("storage: {}", e)),
        }
    }
}

impl From<SanitizeError> for ApiError {
    fn from(e: SanitizeError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_persist::StorageError;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_response() {
        let (status, json) = body_json(ApiError::NotFound("debate 'x' not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_debate_errors_map_to_conflict() {
        let (status, json) = body_json(DebateError::AlreadyJudged.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "ALREADY_JUDGED");

        let duplicate = DebateError::DuplicateVote {
            voter_id: "alice".into(),
        };
        let (status, json) = body_json(duplicate.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["details"]["voter_id"], "alice");
    }

    #[tokio::test]
    async fn test_internal_message_is_hidden() {
        let storage = DebateError::Storage(StorageError::Connection("disk on fire".into()));
        let (status, json) = body_json(storage.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_generation_failure_is_gateway_timeout() {
        let error: ApiError = DebateError::GenerationFailure("round 1 timed out".into()).into();
        assert_eq!(error.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error.code(), "GENERATION_FAILED");
    }
}
