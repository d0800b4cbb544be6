//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use qaboard_core::config::AuthConfig;
use qaboard_core::error::AppError;

use super::claims::Claims;

/// Validates JWT token signatures and expiry.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a login token string.
    ///
    /// A decoded token is necessary but not sufficient: callers must still
    /// validate the embedded session token against the database.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::session_expired("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::invalid_token("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::invalid_token("Invalid token signature")
                    }
                    _ => AppError::invalid_token(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use qaboard_core::config::AuthConfig;
    use qaboard_core::error::ErrorKind;
    use qaboard_entity::user::UserRole;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 24,
        }
    }

    #[test]
    fn round_trips_claims() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let user_id = Uuid::new_v4();
        let (token, _) = encoder
            .generate_token(user_id, "tester@example.com", &UserRole::Tester, "abc123")
            .unwrap();

        let claims = decoder.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "tester@example.com");
        assert_eq!(claims.session_token, "abc123");
    }

    #[test]
    fn rejects_wrong_secret() {
        let encoder = JwtEncoder::new(&test_config());
        let decoder = JwtDecoder::new(&AuthConfig {
            jwt_secret: "other-secret".into(),
            token_ttl_hours: 24,
        });

        let (token, _) = encoder
            .generate_token(Uuid::new_v4(), "a@b.c", &UserRole::Admin, "tok")
            .unwrap();

        let err = decoder.decode_token(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn rejects_garbage_token() {
        let decoder = JwtDecoder::new(&test_config());
        let err = decoder.decode_token("not-a-jwt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }
}
