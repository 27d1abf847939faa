//! Mapping of [`drivetab_core::Error`] onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use drivetab_core::Error;

/// Handler error; renders as a plain-text response.
#[derive(Debug)]
pub struct WebError(pub Error);

impl WebError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Auth { .. } => StatusCode::UNAUTHORIZED,
            Error::Http { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for WebError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "request rejected");
        }
        (status, self.0.to_string()).into_response()
    }
}

/// Handler result.
pub type WebResult<T> = std::result::Result<T, WebError>;
