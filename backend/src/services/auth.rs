//! Authentication service for enterprise registration, login, and token revocation

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::models::UserRole;
use shared::validation;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: i64,
}

/// Input for registering a new enterprise with its admin account
#[derive(Debug, Deserialize)]
pub struct RegisterEnterpriseInput {
    pub enterprise_name: String,
    pub tax_id: String,
    pub owner_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub enterprise_id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub enterprise_id: String,
    pub role: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            token_expiry: config.jwt.token_expiry,
        }
    }

    /// Register a new enterprise with its admin account
    pub async fn register_enterprise(
        &self,
        input: RegisterEnterpriseInput,
    ) -> AppResult<RegisterResponse> {
        if input.enterprise_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "enterprise_name".to_string(),
                message: "Enterprise name is required".to_string(),
                message_pt: "O nome da empresa é obrigatório".to_string(),
            });
        }

        if let Err(msg) = validation::validate_tax_id(&input.tax_id) {
            return Err(AppError::Validation {
                field: "tax_id".to_string(),
                message: msg.to_string(),
                message_pt: "CNPJ inválido".to_string(),
            });
        }

        if let Err(msg) = validation::validate_email(&input.email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
                message_pt: "Email inválido".to_string(),
            });
        }

        if let Err(msg) = validation::validate_password(&input.password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
                message_pt: "A senha não atende aos requisitos mínimos".to_string(),
            });
        }

        if let Some(phone) = &input.phone {
            if let Err(msg) = validation::validate_phone(phone) {
                return Err(AppError::Validation {
                    field: "phone".to_string(),
                    message: msg.to_string(),
                    message_pt: "Telefone inválido".to_string(),
                });
            }
        }

        // Check if the tax id is already registered
        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enterprises WHERE tax_id = $1")
                .bind(&input.tax_id)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "enterprise".to_string(),
                message: "An enterprise with this tax id already exists".to_string(),
                message_pt: "Já existe uma empresa com este CNPJ".to_string(),
            });
        }

        let email_taken =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;

        if email_taken > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        // Create enterprise
        let enterprise_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO enterprises (name, tax_id, email, phone, address, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&input.enterprise_name)
        .bind(&input.tax_id)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .fetch_one(&mut *tx)
        .await?;

        // Create admin user
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (enterprise_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(enterprise_id)
        .bind(&input.owner_name)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(UserRole::Admin.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        // Generate token
        let tokens = self.generate_token(user_id, enterprise_id, UserRole::Admin, &input.owner_name)?;

        Ok(RegisterResponse {
            enterprise_id,
            user_id,
            access_token: tokens.access_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, enterprise_id, email, password_hash, name, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = UserRole::parse(&user.role)
            .ok_or_else(|| AppError::Internal(format!("Unknown role in database: {}", user.role)))?;

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        self.generate_token(user.id, user.enterprise_id, role, &user.name)
    }

    /// Revoke the presented token so it is rejected until it expires
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let claims = self.validate_token(token)?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::Internal("Invalid expiry timestamp in token".to_string()))?;

        // Idempotent: logging out twice with the same token is fine
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token_hash, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(Self::hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Check whether a token has been revoked by logout
    pub async fn is_token_revoked(&self, token: &str) -> AppResult<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_hash = $1)",
        )
        .bind(Self::hash_token(token))
        .fetch_one(&self.db)
        .await?;

        Ok(revoked)
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }

    /// Generate an access token
    fn generate_token(
        &self,
        user_id: Uuid,
        enterprise_id: Uuid,
        role: UserRole,
        name: &str,
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            enterprise_id: enterprise_id.to_string(),
            role: role.as_str().to_string(),
            name: name.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry,
        })
    }

    /// Hash a token for storage in the revocation list
    fn hash_token(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        format!("{:x}", digest)
    }
}

/// Spawn the periodic cleanup of expired revoked tokens. The task runs
/// until the shutdown signal flips and is awaited on server shutdown.
pub fn spawn_revoked_token_cleanup(
    db: PgPool,
    interval: std::time::Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; consume it so the first real
        // cleanup happens one interval after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
                        .execute(&db)
                        .await
                    {
                        Ok(result) if result.rows_affected() > 0 => {
                            tracing::info!(
                                "Purged {} expired revoked tokens",
                                result.rows_affected()
                            );
                        }
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!("Revoked token cleanup failed: {}", err);
                        }
                    }
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        tracing::debug!("Revoked token cleanup task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        let a = AuthService::hash_token("some-token");
        let b = AuthService::hash_token("some-token");
        assert_eq!(a, b);
        // SHA-256 hex digest
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_token_distinguishes_tokens() {
        assert_ne!(
            AuthService::hash_token("token-a"),
            AuthService::hash_token("token-b")
        );
    }
}
