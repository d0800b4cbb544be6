//! Session lifecycle manager — login and logout flows.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use qaboard_core::error::AppError;
use qaboard_database::repositories::user::UserRepository;
use qaboard_entity::session::Session;
use qaboard_entity::user::User;

use crate::jwt::{Claims, JwtEncoder};
use crate::password::PasswordHasher;

use super::store::SessionStore;

/// Result of a successful login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResult {
    /// Signed JWT for the client to hold.
    pub token: String,
    /// Created session row.
    pub session: Session,
    /// The authenticated user.
    pub user: User,
}

/// Manages the session lifecycle around login and logout.
#[derive(Clone)]
pub struct SessionManager {
    /// JWT encoder for token generation.
    jwt_encoder: Arc<JwtEncoder>,
    /// Session persistence.
    session_store: Arc<SessionStore>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    password_hasher: Arc<PasswordHasher>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        jwt_encoder: Arc<JwtEncoder>,
        session_store: Arc<SessionStore>,
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            jwt_encoder,
            session_store,
            user_repo,
            password_hasher,
        }
    }

    /// Performs the complete login flow:
    ///
    /// 1. Validate credentials
    /// 2. Deactivate every prior active session for the user
    /// 3. Insert a fresh active session with a new opaque token
    /// 4. Mark the user online
    /// 5. Return the signed JWT
    ///
    /// Step 2 before step 3 is what enforces single-session-per-user: a
    /// login from a second browser silently revokes the first one, which
    /// then fails its next validation.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::authentication("Invalid email or password"))?;

        let password_valid = self
            .password_hasher
            .verify_password(password, &user.password_hash)?;

        if !password_valid {
            warn!(email = %email, "Login failed: bad password");
            return Err(AppError::authentication("Invalid email or password"));
        }

        let revoked = self
            .session_store
            .deactivate_all_for_user(user.user_id)
            .await?;
        if revoked > 0 {
            info!(
                user_id = %user.user_id,
                revoked = revoked,
                "Revoked prior sessions on new login"
            );
        }

        let session_token = SessionStore::generate_token();
        let (token, expires_at) = self.jwt_encoder.generate_token(
            user.user_id,
            &user.email,
            &user.role,
            &session_token,
        )?;

        let session = self
            .session_store
            .create_session(user.user_id, &session_token, expires_at)
            .await?;

        self.user_repo.mark_online(user.user_id, Utc::now()).await?;

        info!(user_id = %user.user_id, session_id = %session.session_id, "User logged in");

        Ok(LoginResult {
            token,
            session,
            user,
        })
    }

    /// Performs logout for the session named in the claims.
    ///
    /// Idempotent: deactivating an already-inactive or missing session is
    /// not an error, so a stale tab repeating logout always gets a success.
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let rows = self
            .session_store
            .deactivate(claims.sub, &claims.session_token)
            .await?;

        if rows == 0 {
            info!(user_id = %claims.sub, "Logout for already-inactive session");
        } else {
            info!(user_id = %claims.sub, "User logged out");
        }

        self.user_repo.mark_offline(claims.sub).await?;

        Ok(())
    }
}
