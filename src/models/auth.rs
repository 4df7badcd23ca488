use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in the access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub jti: Uuid,
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub expiry: i64, // unix seconds
    pub platform: Option<String>, // User-Agent of the issuing request
}

/// Claims embedded in the refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub jti: Uuid,
    pub access_token: String, // paired access token, retired together on rotation
    pub id: Uuid,
    pub expiry: i64,
    pub platform: Option<String>,
}

/// Value cached under an access token key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEntry {
    #[serde(flatten)]
    pub claims: AccessClaims,
    pub refresh_token: String,
}

/// The authenticated identity resolved from a valid access token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub platform: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<&AccessClaims> for Principal {
    fn from(c: &AccessClaims) -> Self {
        Self {
            id: c.id,
            email: c.email.clone(),
            nickname: c.nickname.clone(),
            platform: c.platform.clone(),
            expires_at: Utc
                .timestamp_opt(c.expiry, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

/// Attached to the request by the auth gate and read back through the `AuthSession` extractor.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String, // always "bearer"
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            token_type: "bearer".to_string(),
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
