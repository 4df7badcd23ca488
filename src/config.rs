use std::env;
use std::time::Duration;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_refresh_secret: String,
    pub jwt_expiry_seconds: u64,
    pub jwt_refresh_expiry_days: u64,
    pub cache_timeout_ms: u64,
    pub session_key_prefix: String,
    pub rate_limit_key_prefix: String,
    pub signin_max_attempts: u64,
    pub signin_window_seconds: u64,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// The subset of [`Config`] the session manager needs.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub algorithm: Algorithm,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub op_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_algorithm: parse_algorithm(
                &env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            )?,
            jwt_refresh_secret: required("JWT_REFRESH_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
            jwt_refresh_expiry_days: env::var("JWT_REFRESH_EXPIRY_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()?,
            cache_timeout_ms: env::var("CACHE_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".into())
                .parse()?,
            session_key_prefix: env::var("SESSION_KEY_PREFIX")
                .unwrap_or_else(|_| "board:session:".into()),
            rate_limit_key_prefix: env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| "board:ratelimit:".into()),
            signin_max_attempts: env::var("SIGNIN_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            signin_window_seconds: env::var("SIGNIN_WINDOW_SECONDS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            algorithm: self.jwt_algorithm,
            refresh_secret: self.jwt_refresh_secret.clone(),
            access_ttl: Duration::from_secs(self.jwt_expiry_seconds),
            refresh_ttl: Duration::from_secs(self.jwt_refresh_expiry_days * 86400),
            op_timeout: self.cache_timeout(),
        }
    }

    pub fn signin_window(&self) -> Duration {
        Duration::from_secs(self.signin_window_seconds)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// `memory://` keeps sessions inside the process instead of Redis.
    pub fn uses_memory_cache(&self) -> bool {
        self.redis_url.starts_with("memory://")
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing required env var: {}", key))
}

/// Tokens are signed with shared secrets, so only the HMAC family is usable.
pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    let algorithm: Algorithm = name
        .trim()
        .to_uppercase()
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown JWT algorithm: {name}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(anyhow::anyhow!(
            "JWT algorithm {other:?} needs a key pair, use HS256, HS384 or HS512"
        )),
    }
}
