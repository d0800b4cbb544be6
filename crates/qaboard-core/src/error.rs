//! Unified application error types for QABoard.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The session-layer kinds
//! (`Authentication`, `InvalidToken`, `SessionExpired`, `SessionInactive`)
//! all collapse to the same caller-visible outcome at the HTTP boundary;
//! the distinction exists for logging and cleanup accounting.
//!
//! The HTTP mapping lives here rather than in the API crate because
//! `IntoResponse` must be implemented next to `AppError` itself.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Bad credentials — the caller must re-enter them.
    Authentication,
    /// Token signature or format failure — the caller must re-authenticate.
    InvalidToken,
    /// The token's expiry claim or the session's `expires_at` has passed.
    SessionExpired,
    /// The session was deactivated by logout, by another login, or by the
    /// inactivity rule.
    SessionInactive,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// A database error occurred.
    Database,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The push stream could not be established or was lost.
    StreamUnavailable,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind represents a session-layer authentication failure.
    ///
    /// All of these map to HTTP 401 and a redirect to login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::InvalidToken
                | Self::SessionExpired
                | Self::SessionInactive
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::SessionInactive => write!(f, "SESSION_INACTIVE"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::StreamUnavailable => write!(f, "STREAM_UNAVAILABLE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout QABoard.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication (bad credentials) error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create a session-expired error.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionExpired, message)
    }

    /// Create a session-inactive error.
    pub fn session_inactive(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionInactive, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a stream-unavailable error.
    pub fn stream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StreamUnavailable, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            // All four session-layer failures are 401: the client reaction
            // is the same (drop local state, go to login), and the body's
            // error code carries the distinction.
            ErrorKind::Authentication
            | ErrorKind::InvalidToken
            | ErrorKind::SessionExpired
            | ErrorKind::SessionInactive => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::StreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Database
            | ErrorKind::Serialization
            | ErrorKind::Configuration
            | ErrorKind::Internal => {
                tracing::error!(error = %self.message, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiErrorResponse {
            error: self.kind.to_string(),
            message: self.message.clone(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_kinds_are_grouped() {
        assert!(ErrorKind::Authentication.is_auth_failure());
        assert!(ErrorKind::InvalidToken.is_auth_failure());
        assert!(ErrorKind::SessionExpired.is_auth_failure());
        assert!(ErrorKind::SessionInactive.is_auth_failure());
        assert!(!ErrorKind::Database.is_auth_failure());
        assert!(!ErrorKind::StreamUnavailable.is_auth_failure());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = AppError::session_inactive("logged out elsewhere");
        assert_eq!(err.to_string(), "SESSION_INACTIVE: logged out elsewhere");
    }

    #[test]
    fn session_failures_map_to_unauthorized() {
        for err in [
            AppError::authentication("bad credentials"),
            AppError::invalid_token("garbled"),
            AppError::session_expired("too old"),
            AppError::session_inactive("revoked"),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn internal_kinds_stay_opaque() {
        let response = AppError::database("connection refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
