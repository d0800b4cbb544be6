//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Query parameters for the event stream endpoint.
///
/// Browsers cannot set headers on an `EventSource`, so the bearer token
/// travels as a query parameter here and only here.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeQuery {
    /// Login JWT.
    pub token: String,
}

/// Action request for the realtime status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeActionRequest {
    /// Requested action; only "status" is supported.
    pub action: String,
}
