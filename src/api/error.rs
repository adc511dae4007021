//! Error responses.
//!
//! Every failure leaves the API as `{ "error": <code>, "message": <text> }`.
//! Errors the user can act on keep their own message; anything else is logged
//! and replaced by a generic localized message for the operation.

use crate::errors::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Message used when a handler gives no operation-specific one.
pub const GENERIC_FAILURE: &str = "Ocorreu um erro inesperado. Tente novamente.";

/// Machine-readable error code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Rejected input
    Validation,
    /// Missing or expired session
    Unauthenticated,
    /// Wrong e-mail or password
    InvalidCredentials,
    /// Permission missing or account protected
    Forbidden,
    /// Unknown record
    NotFound,
    /// Anything else
    Internal,
}

/// JSON error body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Error code
    pub error: ErrorCode,
    /// Localized message
    pub message: String,
}

/// An error on its way to the client
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                message: message.into(),
            },
        }
    }

    /// Maps `err`, using `failure` as the message for internal errors.
    #[must_use]
    pub fn from_error(err: Error, failure: &str) -> Self {
        match err {
            Error::Validation { message } => {
                Self::new(StatusCode::BAD_REQUEST, ErrorCode::Validation, message)
            }
            Error::InvalidAmount { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::Validation,
                "Informe um valor válido.",
            ),
            Error::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidCredentials,
                "Email ou senha incorretos, ou conta inativa.",
            ),
            Error::Unauthenticated => Self::new(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthenticated,
                "Sessão expirada. Faça login novamente.",
            ),
            Error::PermissionDenied { message, .. } | Error::ProtectedAccount { message } => {
                Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
            }
            Error::NotFound { .. } => Self::new(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                "Registro não encontrado.",
            ),
            other => {
                error!("Request failed: {other}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, failure)
            }
        }
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// JSON body
    #[must_use]
    pub const fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::from_error(err, GENERIC_FAILURE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Attaches an operation-specific failure message to a core result.
pub trait OrFailure<T> {
    /// Converts the error, using `failure` for internal errors.
    fn or_failure(self, failure: &str) -> Result<T, ApiError>;
}

impl<T> OrFailure<T> for crate::errors::Result<T> {
    fn or_failure(self, failure: &str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::from_error(err, failure))
    }
}

/// Result of a handler
pub type ApiResult<T> = Result<T, ApiError>;
