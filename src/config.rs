use crate::errors::{AppError, Result};

/// Environment-driven configuration. Token secrets are mandatory; everything
/// else falls back to development defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    /// Access token TTL in seconds.
    pub jwt_access_expires: i64,
    /// Refresh token TTL in seconds.
    pub jwt_refresh_expires: i64,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub database_path: String,
    pub upload_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_access_secret = require_env("JWT_ACCESS_SECRET")?;
        let jwt_refresh_secret = require_env("JWT_REFRESH_SECRET")?;

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            jwt_access_secret,
            jwt_refresh_secret,
            jwt_access_expires: env_number("JWT_ACCESS_EXPIRES", 900),
            jwt_refresh_expires: env_number("JWT_REFRESH_EXPIRES", 1_209_600),
            cors_origins,
            port: env_number("PORT", 8080u16),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "fieldverify.db".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            jwt_access_secret: "test-access-secret".to_string(),
            jwt_refresh_secret: "test-refresh-secret".to_string(),
            jwt_access_expires: 900,
            jwt_refresh_expires: 1_209_600,
            cors_origins: vec!["http://localhost:3000".to_string()],
            port: 0,
            database_path: ":memory:".to_string(),
            upload_dir: "uploads".to_string(),
        }
    }
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
