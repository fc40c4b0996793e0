//! JWT access-token and password-reset-token generation and validation.
//!
//! Access tokens are HS256-signed JWTs carrying the user's full profile in
//! [`Claims`], so clients can render without a profile lookup. Reset tokens
//! carry only the user id and a fixed `purpose`; the two shapes never
//! validate as each other.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use ptw_core::types::DbId;
use ptw_db::models::user::User;
use serde::{Deserialize, Serialize};

/// `purpose` claim of password-reset tokens.
pub const RESET_PURPOSE: &str = "password_reset";

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Business key (`users.user_id`).
    pub user_id: String,
    /// `admin`, `supervisor` or `worker`.
    pub user_type: String,
    pub name: String,
    pub email: String,
    pub domain: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Claims of a password-reset token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResetClaims {
    pub sub: DbId,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in hours (default: 24).
    pub access_token_expiry_hours: i64,
    /// Password-reset token lifetime in minutes (default: 60).
    pub reset_token_expiry_mins: i64,
}

/// Default access token expiry in hours.
const DEFAULT_ACCESS_EXPIRY_HOURS: i64 = 24;
/// Default reset token expiry in minutes.
const DEFAULT_RESET_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `JWT_SECRET`            | **yes**  | --      |
    /// | `JWT_EXPIRY_HOURS`      | no       | `24`    |
    /// | `JWT_RESET_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_hours: i64 = std::env::var("JWT_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_HOURS.to_string())
            .parse()
            .expect("JWT_EXPIRY_HOURS must be a valid i64");

        let reset_token_expiry_mins: i64 = std::env::var("JWT_RESET_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_RESET_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_RESET_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            access_token_expiry_hours,
            reset_token_expiry_mins,
        }
    }
}

/// Generate an HS256 access token carrying the user's profile.
pub fn generate_access_token(
    user: &User,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        user_id: user.user_id.clone(),
        user_type: user.user_type.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        domain: user.domain.clone(),
        contact: user.contact.clone(),
        location: user.location.clone(),
        city: user.city.clone(),
        state: user.state.clone(),
        iat: now,
        exp: now + config.access_token_expiry_hours * 3600,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Generate a short-lived password-reset token for a user id.
pub fn generate_reset_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = ResetClaims {
        sub: user_id,
        purpose: RESET_PURPOSE.to_string(),
        iat: now,
        exp: now + config.reset_token_expiry_mins * 60,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate a password-reset token and return the user id it was issued for.
///
/// Returns `None` for anything that is not a live reset token, including
/// valid access tokens.
pub fn validate_reset_token(token: &str, config: &JwtConfig) -> Option<DbId> {
    let token_data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    (token_data.claims.purpose == RESET_PURPOSE).then_some(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_hours: 24,
            reset_token_expiry_mins: 60,
        }
    }

    fn test_user() -> User {
        User {
            id: 7,
            user_id: "SUP001".to_string(),
            name: "Jo Supervisor".to_string(),
            email: "jo@test.com".to_string(),
            password_hash: "irrelevant".to_string(),
            user_type: "supervisor".to_string(),
            domain: Some("Electrical".to_string()),
            contact: None,
            location: None,
            city: Some("Pune".to_string()),
            state: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_carries_profile() {
        let config = test_config();
        let token = generate_access_token(&test_user(), &config).expect("token generation");

        let claims = validate_token(&token, &config).expect("token validation");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.user_id, "SUP001");
        assert_eq!(claims.user_type, "supervisor");
        assert_eq!(claims.domain.as_deref(), Some("Electrical"));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let user = test_user();
        let claims = Claims {
            sub: user.id,
            user_id: user.user_id,
            user_type: user.user_type,
            name: user.name,
            email: user.email,
            domain: None,
            contact: None,
            location: None,
            city: None,
            state: None,
            // Well beyond the default 60-second leeway.
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let token = generate_access_token(&test_user(), &test_config()).unwrap();
        let other = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };
        assert!(validate_token(&token, &other).is_err());
    }

    #[test]
    fn test_reset_and_access_tokens_do_not_mix() {
        let config = test_config();
        let reset = generate_reset_token(7, &config).unwrap();
        let access = generate_access_token(&test_user(), &config).unwrap();

        assert_eq!(validate_reset_token(&reset, &config), Some(7));
        assert_eq!(validate_reset_token(&access, &config), None);
        assert!(validate_token(&reset, &config).is_err());
    }
}
