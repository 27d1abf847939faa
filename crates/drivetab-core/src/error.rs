//! Error types for drivetab.

use std::path::Path;

/// Errors that can occur while searching, loading or exporting spreadsheets.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Input validation error
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// I/O error (file operations, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication or authorization failure
    #[error("Authentication error: {message}")]
    Auth {
        /// Human-readable error message
        message: String,
    },

    /// HTTP call to the storage provider failed
    #[error("HTTP error{}: {message}", status_suffix(.status))]
    Http {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Human-readable error message
        message: String,
    },

    /// A spreadsheet could not be decoded
    #[error("Spreadsheet error: {message}")]
    Spreadsheet {
        /// What went wrong
        message: String,
    },

    /// The dataset could not be exported
    #[error("Export error: {message}")]
    Export {
        /// What went wrong
        message: String,
    },

    /// A requested item does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing item
        what: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Convenience `Result` type alias for drivetab operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Retryable errors are transient transport failures: I/O errors,
    /// connection failures without a status, rate limits (429) and
    /// server errors (5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Http { status: None, .. } => true,
            Error::Http {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            Error::Config { .. }
            | Error::Validation { .. }
            | Error::Serialization(_)
            | Error::Auth { .. }
            | Error::Spreadsheet { .. }
            | Error::Export { .. }
            | Error::NotFound { .. } => false,
        }
    }

    /// Returns whether the credentials themselves were refused: an
    /// authentication error or an HTTP 401.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Auth { .. }
                | Error::Http {
                    status: Some(401),
                    ..
                }
        )
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    /// Creates an HTTP error for a response with the given status.
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Http {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an HTTP error for a request that never got a response.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Http {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a new spreadsheet decoding error.
    pub fn spreadsheet<S: Into<String>>(message: S) -> Self {
        Error::Spreadsheet {
            message: message.into(),
        }
    }

    /// Creates a new export error.
    pub fn export<S: Into<String>>(message: S) -> Self {
        Error::Export {
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Wraps an I/O error with the path it concerns.
    pub fn io_with_path(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Error::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    }
}
