//! JWT session token creation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, UserRole};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::config::AppConfig;
use crate::errors::ApiError;

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i32,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// Create an HS256 token for a user session
pub fn create_session_token(user: &user::Model, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user.id,
        role: user.role,
        exp: (now + Duration::hours(config.jwt_expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| ApiError::Internal(format!("create JWT: {e}")))
}

/// Verify and decode a session token
pub fn verify_session_token(token: &str, config: &AppConfig) -> Result<CurrentUser, ApiError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let data = decode::<SessionClaims>(token, &key, &Validation::default()).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token has expired".to_string()),
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => ApiError::Unauthorized("Invalid token".to_string()),
        _ => ApiError::Internal(format!("JWT verification: {e}")),
    })?;

    Ok(CurrentUser::from(data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 24,
            otp_ttl_minutes: 10,
            frontend_url: "http://localhost".to_string(),
        }
    }

    fn user(role: UserRole) -> user::Model {
        let now = Utc::now().naive_utc();
        user::Model {
            id: 42,
            name: "Jordan".to_string(),
            email: "jordan@example.com".to_string(),
            password_hash: String::new(),
            role,
            otp: None,
            otp_expires_at: None,
            group_id: None,
            is_delete: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_id_and_role() {
        let config = config();
        let token = create_session_token(&user(UserRole::SuperAdmin), &config).unwrap();
        let current = verify_session_token(&token, &config).unwrap();
        assert_eq!(current.id, 42);
        assert_eq!(current.role, UserRole::SuperAdmin);
    }

    #[test]
    fn test_wrong_secret_and_expired_tokens_are_rejected() {
        let config = config();
        let token = create_session_token(&user(UserRole::User), &config).unwrap();
        let other = AppConfig {
            jwt_secret: "other".to_string(),
            ..config.clone()
        };
        assert!(matches!(
            verify_session_token(&token, &other),
            Err(ApiError::Unauthorized(_))
        ));

        let expired = AppConfig {
            jwt_expiry_hours: -2,
            ..config.clone()
        };
        let token = create_session_token(&user(UserRole::User), &expired).unwrap();
        assert!(matches!(
            verify_session_token(&token, &config),
            Err(ApiError::Unauthorized(message)) if message == "Token has expired"
        ));
        assert!(matches!(
            verify_session_token("not-a-token", &config),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
