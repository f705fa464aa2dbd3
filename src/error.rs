use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

/// Application-level error taxonomy. Every handler failure flows through
/// here; no variant ever serializes internal detail to the client.
///
/// Field-level validation failures are [`crate::validate::ValidationError`]
/// and never reach this enum: handlers collect them and re-render the form
/// payload with messages instead of erroring out.
#[derive(Debug, Error)]
pub enum AppError {
    /// No live session on a protected route. Raised by the `CurrentUser`
    /// extractor, which flashes "Please login first!" before rejecting.
    #[error("login required")]
    Unauthorized,

    /// Authenticated but not the owner. Contact deletion deliberately does
    /// not raise this (cross-owner delete is a silent no-op), so it is
    /// reserved for future routes.
    #[error("forbidden")]
    Forbidden,

    /// Unique-constraint clash, e.g. a duplicate handle at registration.
    #[error("conflict")]
    Conflict,

    /// Missing or mismatched CSRF token, or an otherwise malformed request.
    #[error("bad request")]
    BadRequest,

    /// Store or infrastructure fault. Detail goes to the log only.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => Redirect::to("/login").into_response(),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            AppError::Conflict => (StatusCode::CONFLICT, "Conflict").into_response(),
            AppError::BadRequest => (StatusCode::BAD_REQUEST, "Bad request").into_response(),
            AppError::Internal(e) => {
                error!(error = %e, "internal fault");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}
