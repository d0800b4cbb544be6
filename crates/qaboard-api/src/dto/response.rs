//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qaboard_auth::session::cleanup::CleanupReport;
use qaboard_entity::user::User;

/// Standard success wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

/// Public user shape returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub user_id: Uuid,
    /// Email.
    pub email: String,
    /// Display name.
    pub user_name: String,
    /// Role name.
    pub role: String,
    /// Online flag.
    pub is_online: bool,
    /// Last login timestamp.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            user_name: user.user_name,
            role: user.role.to_string(),
            is_online: user.is_online,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed JWT for subsequent requests.
    pub token: String,
    /// Token expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: UserResponse,
}

/// Cleanup endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    /// Counts of rows touched in this cycle.
    pub report: CleanupReport,
    /// When the cycle ran.
    pub timestamp: DateTime<Utc>,
}

/// Realtime status action response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeStatusResponse {
    /// Open connections in this process.
    pub connections: usize,
    /// Whether the notification listener is up.
    pub is_listening: bool,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status string.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Database ping result: `"ok"` or `"unavailable"`.
    pub database: String,
}
