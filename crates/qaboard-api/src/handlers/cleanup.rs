//! Secret-guarded cleanup endpoint for external schedulers.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use tracing::info;

use qaboard_core::error::AppError;

use crate::dto::response::{ApiResponse, CleanupResponse};
use crate::state::AppState;

/// Header carrying the scheduler's shared secret.
const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// POST /api/cron/cleanup-sessions
///
/// Same sweep the interval task runs, triggerable by an external cron
/// with the shared secret. The two never conflict: every sweep statement
/// is conditional on current row state.
pub async fn cleanup_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CleanupResponse>>, AppError> {
    let secret = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing cron secret"))?;

    if secret != state.config.session.cleanup_secret {
        return Err(AppError::authentication("Invalid cron secret"));
    }

    let report = state.session_cleanup.run_cleanup().await?;
    info!(
        inactive = report.inactive,
        expired = report.expired,
        deleted = report.deleted,
        "Cleanup run triggered via cron endpoint"
    );

    Ok(Json(ApiResponse::ok(CleanupResponse {
        report,
        timestamp: Utc::now(),
    })))
}
