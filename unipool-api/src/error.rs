use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use unipool_ride::{LifecycleError, RideError};

#[derive(Debug)]
pub enum AppError {
    Unauthenticated(String),
    Forbidden(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

/// Error-taxonomy mapping: validation 400, authorization 403, missing 404,
/// conflicts 409. Joining your own ride counts as authorization (the owner
/// is forbidden), per the ride rules rather than the transport.
impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::RideNotFound => AppError::NotFound("Ride not found".to_string()),
            LifecycleError::NotAuthorized(msg) => AppError::Forbidden(msg.to_string()),
            LifecycleError::Ride(ride_err) => match ride_err {
                RideError::CannotJoinOwnRide => AppError::Forbidden(ride_err.to_string()),
                RideError::AlreadyRequested
                | RideError::NoSeatsAvailable
                | RideError::RequestNotFound
                | RideError::OtpNotFound => AppError::Conflict(ride_err.to_string()),
            },
            LifecycleError::Contention => AppError::Conflict(err.to_string()),
            LifecycleError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

/// Shorthand for repository/collaborator failures that carry no caller
/// -actionable detail.
pub fn internal<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Internal(err.to_string())
}
