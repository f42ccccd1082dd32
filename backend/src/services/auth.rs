//! Authentication service for registration, login, and token management

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine as _};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::{validate_indian_phone, UserType};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new account with its profile
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub user_type: UserType,
}

/// Response after successful registration or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub user_type: UserType,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub profile_id: String,
    pub user_type: UserType,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Account row joined with its profile
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    password_hash: String,
    is_active: bool,
    profile_id: Uuid,
    user_type: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new user and create their profile
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        input.validate()?;

        if let Some(phone) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_indian_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        let email = input.email.trim().to_lowercase();

        // Check if email already exists
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "email".to_string(),
                message: "An account with this email already exists".to_string(),
            });
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO profiles (user_id, full_name, phone, location, user_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(input.full_name.trim())
        .bind(&input.phone)
        .bind(&input.location)
        .bind(input.user_type.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%user_id, user_type = %input.user_type, "Registered new account");

        let tokens = self.issue_tokens(user_id, profile_id, input.user_type).await?;

        Ok(AuthResponse {
            user_id,
            profile_id,
            user_type: input.user_type,
            tokens,
        })
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let account = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT u.id, u.password_hash, u.is_active, p.id AS profile_id, p.user_type
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE u.email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let valid = verify(password, &account.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(account.id)
            .execute(&self.db)
            .await?;

        let user_type = parse_user_type(&account.user_type)?;
        let tokens = self.issue_tokens(account.id, account.profile_id, user_type).await?;

        Ok(AuthResponse {
            user_id: account.id,
            profile_id: account.profile_id,
            user_type,
            tokens,
        })
    }

    /// Exchange a refresh token for a new token pair, revoking the old one
    ///
    /// Revocation is one conditional UPDATE; a token is consumed at most once.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let token_hash = hash_refresh_token(&self.jwt_secret, refresh_token)?;

        let mut tx = self.db.begin().await?;

        let revoked = sqlx::query_scalar::<_, Uuid>(REVOKE_REFRESH_TOKEN)
            .bind(&token_hash)
            .fetch_optional(&mut *tx)
            .await?;
        let user_id = live_token_owner(revoked)?;

        let (profile_id, user_type) = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT p.id, p.user_type
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE u.id = $1 AND u.is_active = true
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account is disabled".to_string()))?;

        tx.commit().await?;

        let user_type = parse_user_type(&user_type)?;
        let tokens = self.issue_tokens(user_id, profile_id, user_type).await?;

        Ok(AuthResponse {
            user_id,
            profile_id,
            user_type,
            tokens,
        })
    }

    /// Generate a token pair and persist the refresh token hash
    async fn issue_tokens(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
        user_type: UserType,
    ) -> AppResult<AuthTokens> {
        let access_token = encode_access_token(
            &self.jwt_secret,
            user_id,
            profile_id,
            user_type,
            self.access_token_expiry,
        )?;

        let refresh_token = Uuid::new_v4().to_string();
        let token_hash = hash_refresh_token(&self.jwt_secret, &refresh_token)?;
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}

/// Sign an access token for the given account
pub fn encode_access_token(
    secret: &str,
    user_id: Uuid,
    profile_id: Uuid,
    user_type: UserType,
    expiry_secs: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        profile_id: profile_id.to_string(),
        user_type,
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return its claims
pub fn decode_access_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Keyed hash of a refresh token for storage
pub fn hash_refresh_token(secret: &str, token: &str) -> AppResult<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
    mac.update(token.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Revokes a live refresh token and returns its owner; no row once used or expired
const REVOKE_REFRESH_TOKEN: &str = r#"
    UPDATE refresh_tokens
    SET revoked_at = NOW()
    WHERE token_hash = $1
      AND revoked_at IS NULL
      AND expires_at > NOW()
    RETURNING user_id
"#;

/// Owner of a refresh token the revocation actually consumed
fn live_token_owner(revoked: Option<Uuid>) -> AppResult<Uuid> {
    revoked.ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))
}

fn parse_user_type(value: &str) -> AppResult<UserType> {
    value
        .parse()
        .map_err(|_| AppError::Internal(format!("Unknown user type in database: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let profile_id = Uuid::new_v4();
        let token =
            encode_access_token(SECRET, user_id, profile_id, UserType::Farmer, 3600).unwrap();

        let claims = decode_access_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.profile_id, profile_id.to_string());
        assert_eq!(claims.user_type, UserType::Farmer);
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let token =
            encode_access_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), UserType::Consumer, 3600)
                .unwrap();
        assert!(matches!(
            decode_access_token("other-secret", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token =
            encode_access_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), UserType::Consumer, -3600)
                .unwrap();
        assert!(decode_access_token(SECRET, &token).is_err());
    }

    #[test]
    fn test_refresh_token_hash_is_keyed() {
        let a = hash_refresh_token(SECRET, "token").unwrap();
        let b = hash_refresh_token(SECRET, "token").unwrap();
        let c = hash_refresh_token("other-secret", "token").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_used_refresh_token_rejected() {
        let owner = Uuid::new_v4();
        assert_eq!(live_token_owner(Some(owner)).unwrap(), owner);
        // A second use finds the token already revoked and gets no row back
        assert!(matches!(live_token_owner(None), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_revocation_only_consumes_live_tokens() {
        let sql: String = REVOKE_REFRESH_TOKEN.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(sql.starts_with("UPDATE refresh_tokens SET revoked_at = NOW()"));
        assert!(sql.contains("AND revoked_at IS NULL"));
        assert!(sql.contains("AND expires_at > NOW()"));
        assert!(sql.ends_with("RETURNING user_id"));
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            full_name: "Asha".to_string(),
            phone: None,
            location: None,
            user_type: UserType::Farmer,
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
