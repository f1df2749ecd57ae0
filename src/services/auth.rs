use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::user::User;
use crate::services::jwt::{JwtManager, TokenPair};
use crate::utils::crypto;
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    database: Arc<SqliteDatabase>,
    jwt: Arc<JwtManager>,
}

impl AuthService {
    pub fn new(database: Arc<SqliteDatabase>, jwt: Arc<JwtManager>) -> Self {
        Self { database, jwt }
    }

    /// Looks the user up by email or phone and checks the password. Unknown
    /// identifier and wrong password collapse into the same error so the
    /// response does not leak which one it was.
    pub async fn validate(&self, identifier: &str, password: &str) -> Result<User> {
        let user = self
            .database
            .get_user_by_identifier(identifier)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !crypto::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<(TokenPair, User)> {
        let user = self.validate(identifier, password).await?;
        let tokens = self.jwt.issue_tokens(&user)?;
        Ok((tokens, user))
    }

    /// Exchanges a valid refresh token for a fresh pair. The subject must
    /// still exist; tokens are otherwise stateless and cannot be revoked
    /// before expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.jwt.verify_refresh(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
        let user = self
            .database
            .get_user_by_id(&user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        self.jwt.issue_tokens(&user)
    }
}
