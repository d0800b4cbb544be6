//! QA Board Server — session lifecycle and real-time presence backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use qaboard_core::config::AppConfig;
use qaboard_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("QABOARD_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting QA Board server v{}", env!("CARGO_PKG_VERSION"));

    // ── Database connection + migrations ─────────────────────────
    let database = qaboard_database::connection::DatabasePool::connect(&config.database).await?;
    qaboard_database::migration::run_migrations(database.pool()).await?;
    let db_pool = database.pool().clone();

    // ── Repositories ─────────────────────────────────────────────
    let user_repo = Arc::new(qaboard_database::repositories::user::UserRepository::new(
        db_pool.clone(),
    ));
    let session_repo =
        Arc::new(qaboard_database::repositories::session::SessionRepository::new(db_pool.clone()));

    // ── Auth components ──────────────────────────────────────────
    let jwt_encoder = Arc::new(qaboard_auth::jwt::encoder::JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(qaboard_auth::jwt::decoder::JwtDecoder::new(&config.auth));
    let password_hasher = Arc::new(qaboard_auth::password::hasher::PasswordHasher::new());

    let session_store = Arc::new(qaboard_auth::session::store::SessionStore::new(
        Arc::clone(&session_repo),
        config.session.clone(),
    ));
    let session_manager = Arc::new(qaboard_auth::session::manager::SessionManager::new(
        Arc::clone(&jwt_encoder),
        Arc::clone(&session_store),
        Arc::clone(&user_repo),
        Arc::clone(&password_hasher),
    ));
    let session_validator = Arc::new(qaboard_auth::session::validator::SessionValidator::new(
        Arc::clone(&jwt_decoder),
        Arc::clone(&session_store),
        Arc::clone(&user_repo),
        config.session.clone(),
    ));
    let session_cleanup = Arc::new(qaboard_auth::session::cleanup::SessionCleanup::new(
        Arc::clone(&session_store),
        Arc::clone(&user_repo),
    ));

    // ── Realtime components ──────────────────────────────────────
    let registry = Arc::new(qaboard_realtime::registry::ConnectionRegistry::new(
        config.realtime.clone(),
    ));
    let bridge = Arc::new(qaboard_realtime::bridge::NotificationBridge::new(
        db_pool.clone(),
        Arc::clone(&registry),
    ));

    // ── Background tasks ─────────────────────────────────────────
    let cleanup_interval =
        std::time::Duration::from_secs(config.session.cleanup_interval_minutes * 60);
    let cleanup_task = tokio::spawn(Arc::clone(&session_cleanup).run_periodic(cleanup_interval));
    let keepalive_task = tokio::spawn(Arc::clone(&registry).run_keepalive());
    let sweeper_task = tokio::spawn(Arc::clone(&registry).run_sweeper());

    // ── HTTP server ──────────────────────────────────────────────
    let app_state = qaboard_api::state::AppState {
        config: Arc::new(config.clone()),
        db_pool,
        jwt_encoder,
        jwt_decoder,
        session_manager,
        session_validator,
        session_cleanup,
        user_repo,
        registry,
        bridge,
    };

    let app = qaboard_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("QA Board server listening on {addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cleanup_task.abort();
    keepalive_task.abort();
    sweeper_task.abort();
    database.close().await;

    tracing::info!("QA Board server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
