//! `AuthUser` extractor — pulls the JWT from the Authorization header and
//! runs full session validation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use qaboard_auth::jwt::Claims;
use qaboard_core::error::AppError;
use qaboard_entity::session::Session;

use crate::state::AppState;

/// Authenticated request context available to handlers.
///
/// Construction goes through the session validator, so holding an
/// `AuthUser` means the JWT verified AND the backing session row was
/// active at the start of the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Decoded token claims.
    pub claims: Claims,
    /// The validated session row.
    pub session: Session,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let (claims, session) = state.session_validator.validate(token).await?;

        Ok(AuthUser { claims, session })
    }
}
