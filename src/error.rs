use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::room::{AdmissionError, StartError, SubmitError},
};

/// Errors that can occur in service layer operations.
///
/// The variants form the stable error taxonomy surfaced to clients: each maps
/// to a fixed kind string and an HTTP status, so callers can branch on kinds
/// instead of parsing messages.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The requester is not allowed to perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation cannot be performed in the current room status.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The room has reached its participant cap.
    #[error("{0}")]
    RoomFull(String),
    /// The room is finished and no longer admits participants.
    #[error("{0}")]
    RoomClosed(String),
    /// The user is already enrolled in the room.
    #[error("{0}")]
    AlreadyJoined(String),
    /// The participant has already submitted an answer sheet.
    #[error("{0}")]
    AlreadySubmitted(String),
    /// The user is not enrolled in the room.
    #[error("{0}")]
    NotAParticipant(String),
    /// The quiz has not been generated yet.
    #[error("{0}")]
    NotReady(String),
    /// The question source failed beyond local recovery.
    #[error("question generation failed: {0}")]
    ExternalService(String),
}

impl ServiceError {
    /// Stable machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Unavailable(_) | ServiceError::Degraded => "storage_unavailable",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::RoomFull(_) => "room_full",
            ServiceError::RoomClosed(_) => "room_closed",
            ServiceError::AlreadyJoined(_) => "already_joined",
            ServiceError::AlreadySubmitted(_) => "already_submitted",
            ServiceError::NotAParticipant(_) => "not_a_participant",
            ServiceError::NotReady(_) => "not_ready",
            ServiceError::ExternalService(_) => "external_service_error",
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(format!("validation failed: {err}"))
    }
}

impl From<AdmissionError> for ServiceError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Closed => ServiceError::RoomClosed(err.to_string()),
            AdmissionError::Full { .. } => ServiceError::RoomFull(err.to_string()),
            AdmissionError::AlreadyJoined => ServiceError::AlreadyJoined(err.to_string()),
        }
    }
}

impl From<StartError> for ServiceError {
    fn from(err: StartError) -> Self {
        match err {
            StartError::NotWaiting { .. } => ServiceError::InvalidState(err.to_string()),
            // A mismatched question count means generation itself misbehaved.
            StartError::WrongQuestionCount { .. } => ServiceError::ExternalService(err.to_string()),
        }
    }
}

impl From<SubmitError> for ServiceError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NotReady => ServiceError::NotReady(err.to_string()),
            SubmitError::AnswerCountMismatch { .. } => ServiceError::Validation(err.to_string()),
            SubmitError::NotAParticipant => ServiceError::NotAParticipant(err.to_string()),
            SubmitError::AlreadySubmitted => ServiceError::AlreadySubmitted(err.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client-fixable request problem; carries the taxonomy kind.
    #[error("bad request: {message}")]
    BadRequest {
        kind: &'static str,
        message: String,
    },
    /// Missing or malformed requester identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Wrong actor for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        kind: &'static str,
        message: String,
    },
    /// Internal server error; detail is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable {
                kind,
                message: source.to_string(),
            },
            ServiceError::Degraded => AppError::ServiceUnavailable {
                kind,
                message: "degraded mode".into(),
            },
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::ExternalService(message) => AppError::ServiceUnavailable {
                kind,
                message,
            },
            ServiceError::Validation(message)
            | ServiceError::InvalidState(message)
            | ServiceError::RoomFull(message)
            | ServiceError::RoomClosed(message)
            | ServiceError::AlreadyJoined(message)
            | ServiceError::AlreadySubmitted(message)
            | ServiceError::NotAParticipant(message)
            | ServiceError::NotReady(message) => AppError::BadRequest { kind, message },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message) = match self {
            AppError::BadRequest { kind, message } => (StatusCode::BAD_REQUEST, kind, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            AppError::ServiceUnavailable { kind, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, kind, message)
            }
            AppError::Internal(message) => {
                error!(%message, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let payload = Json(ErrorBody {
            error: kind,
            message,
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_errors_map_to_their_kinds() {
        let full: ServiceError = AdmissionError::Full { max: 4 }.into();
        assert_eq!(full.kind(), "room_full");

        let closed: ServiceError = AdmissionError::Closed.into();
        assert_eq!(closed.kind(), "room_closed");

        let duplicate: ServiceError = AdmissionError::AlreadyJoined.into();
        assert_eq!(duplicate.kind(), "already_joined");
    }

    #[test]
    fn submission_count_mismatch_is_a_validation_error_naming_counts() {
        let err: ServiceError = SubmitError::AnswerCountMismatch {
            expected: 10,
            actual: 7,
        }
        .into();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(err.to_string(), "invalid input: expected 10 answers, got 7");
    }
}
