//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use qaboard_auth::jwt::decoder::JwtDecoder;
use qaboard_auth::jwt::encoder::JwtEncoder;
use qaboard_auth::session::cleanup::SessionCleanup;
use qaboard_auth::session::manager::SessionManager;
use qaboard_auth::session::validator::SessionValidator;
use qaboard_core::config::AppConfig;
use qaboard_database::repositories::user::UserRepository;
use qaboard_realtime::bridge::NotificationBridge;
use qaboard_realtime::registry::ConnectionRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// JWT token encoder
    pub jwt_encoder: Arc<JwtEncoder>,
    /// JWT token decoder
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Session lifecycle manager
    pub session_manager: Arc<SessionManager>,
    /// Per-request session validator
    pub session_validator: Arc<SessionValidator>,
    /// Session cleanup job
    pub session_cleanup: Arc<SessionCleanup>,
    /// User repository
    pub user_repo: Arc<UserRepository>,
    /// Event stream connection registry
    pub registry: Arc<ConnectionRegistry>,
    /// Database notification bridge
    pub bridge: Arc<NotificationBridge>,
}
