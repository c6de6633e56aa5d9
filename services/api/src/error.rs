//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service, and the mapping from
//! core port errors to HTTP responses used by every handler.

use crate::config::ConfigError;
use axum::http::StatusCode;
use tracing::error;
use tutor_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The error half of every handler's return type.
pub type HttpError = (StatusCode, String);

/// Logs a port error and converts it into a status code and a client-safe message.
///
/// Validation and authorization messages are shown to the client as-is; anything
/// coming from a failing dependency is replaced by `fallback`.
pub fn port_error(e: PortError, fallback: &str) -> HttpError {
    match e {
        PortError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Unavailable(msg) => {
            error!("Dependency unavailable: {}", msg);
            (StatusCode::SERVICE_UNAVAILABLE, fallback.to_string())
        }
        PortError::Unexpected(msg) => {
            error!("{}: {}", fallback, msg);
            (StatusCode::INTERNAL_SERVER_ERROR, fallback.to_string())
        }
    }
}
