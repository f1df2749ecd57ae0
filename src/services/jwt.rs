use crate::config::Config;
use crate::errors::{AppError, Result};
use crate::models::user::{Role, User};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token payload: subject, role and org, short-lived.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: String,
    pub org: String,
    pub exp: i64,
    pub iat: i64,
}

/// Refresh token payload: subject only, long-lived, distinct secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtManager {
    access_secret: String,
    refresh_secret: String,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl JwtManager {
    pub fn new(access_secret: String, refresh_secret: String, access_ttl: i64, refresh_ttl: i64) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_access_secret.clone(),
            config.jwt_refresh_secret.clone(),
            config.jwt_access_expires,
            config.jwt_refresh_expires,
        )
    }

    /// Issues a stateless access/refresh pair. Signing only fails on a broken
    /// key setup, which is a process misconfiguration rather than a request
    /// error, hence the Internal mapping.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair> {
        let now = Utc::now().timestamp();

        let access = AccessClaims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            org: user.org_id.to_string(),
            exp: now + self.access_ttl,
            iat: now,
        };
        let access_token = encode(
            &Header::default(),
            &access,
            &EncodingKey::from_secret(self.access_secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        let refresh = RefreshClaims {
            sub: user.id.to_string(),
            exp: now + self.refresh_ttl,
            iat: now,
        };
        let refresh_token = encode(
            &Header::default(),
            &refresh,
            &EncodingKey::from_secret(self.refresh_secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_ref()),
            &strict_validation(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        let data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_ref()),
            &strict_validation(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims)
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}

/// Authenticated identity threaded into every guarded handler.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub org_id: Uuid,
}

impl Principal {
    pub fn require_role(&self, allowed: &[Role]) -> Result<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl TryFrom<AccessClaims> for Principal {
    type Error = AppError;

    fn try_from(claims: AccessClaims) -> Result<Self> {
        Ok(Self {
            id: Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?,
            role: Role::parse(&claims.role).ok_or(AppError::InvalidToken)?,
            org_id: Uuid::parse_str(&claims.org).map_err(|_| AppError::InvalidToken)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manager() -> JwtManager {
        JwtManager::new("access-secret".into(), "refresh-secret".into(), 900, 1_209_600)
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Field Agent".to_string(),
            email: "field@hq.test".to_string(),
            phone: None,
            role: Role::Field,
            password_hash: "unused".to_string(),
            org_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_to_principal() {
        let jwt = manager();
        let user = sample_user();
        let pair = jwt.issue_tokens(&user).unwrap();

        let claims = jwt.verify_access(&pair.access_token).unwrap();
        let principal = Principal::try_from(claims).unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.role, user.role);
        assert_eq!(principal.org_id, user.org_id);
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let jwt = manager();
        let user = sample_user();
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            org: user.org_id.to_string(),
            exp: now - 120,
            iat: now - 1000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("access-secret".as_ref()),
        )
        .unwrap();

        assert!(matches!(jwt.verify_access(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let jwt = manager();
        let pair = jwt.issue_tokens(&sample_user()).unwrap();

        // Distinct secrets: a refresh token never verifies as access and
        // vice versa.
        assert!(jwt.verify_access(&pair.refresh_token).is_err());
        assert!(jwt.verify_refresh(&pair.access_token).is_err());
        assert!(jwt.verify_refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = manager();
        let pair = jwt.issue_tokens(&sample_user()).unwrap();
        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert!(jwt.verify_access(&tampered).is_err());
    }

    #[test]
    fn role_allow_list_is_enforced() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::Client,
            org_id: Uuid::new_v4(),
        };
        assert!(principal.require_role(&[Role::Client, Role::Admin]).is_ok());
        assert!(matches!(
            principal.require_role(&[Role::Admin]),
            Err(AppError::Forbidden)
        ));
    }
}
