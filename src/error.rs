use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Every credential and ledger operation either returns a value or fails
/// with exactly one of these kinds.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid login")]
    InvalidCredentials,
    #[error("missing or invalid credentials")]
    Unauthenticated,
    #[error("you don't own this voting")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid token")]
    InvalidToken,
    #[error("option does not exist")]
    InvalidOption,
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::InvalidOption
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The cause never leaves the process; log it before collapsing to the
        // generic message.
        if let AppError::Internal(cause) = &self {
            tracing::error!(error = ?cause, "Request failed with internal error.");
        }

        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}
