use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::SessionSettings,
    error::AuthError,
    models::{
        auth::{AccessClaims, AccessEntry, AuthSession, Principal, RefreshClaims, TokenPair},
        user::User,
    },
    services::{
        cache::{CacheError, SessionCache},
        token::TokenCodec,
        users::UserStore,
    },
};

/// Issues, verifies, rotates and revokes access/refresh token pairs.
///
/// The session cache is the source of truth: a token is valid only while its
/// cache entry exists. Pairs move `ISSUED -> ACTIVE -> ROTATED | REVOKED` and
/// are never mutated once stored.
pub struct SessionManager {
    cache: Arc<dyn SessionCache>,
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    op_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        users: Arc<dyn UserStore>,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            cache,
            users,
            codec: TokenCodec::new(settings.algorithm),
            refresh_secret: settings.refresh_secret.clone(),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            op_timeout: settings.op_timeout,
        }
    }

    /// Round-trips the session cache within the operation timeout.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.bounded(self.cache.ping()).await
    }

    /// Checks credentials and issues a fresh pair.
    /// Nothing is written to the cache unless the password matches.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        platform: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .lookup(self.users.find_by_email(email))
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !self.users.verify_password(&user, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue(&user, platform).await?;
        info!(user_id = %user.id, "user signed in");
        Ok(pair)
    }

    /// Mints and stores a new pair for `user`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn issue(&self, user: &User, platform: Option<&str>) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();
        let platform = platform.map(str::to_string);

        let access = AccessClaims {
            jti: Uuid::new_v4(),
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            expiry: now + self.access_ttl.as_secs() as i64,
            platform: platform.clone(),
        };
        let access_token = self.codec.encode_access(&access, &user.password_hash)?;

        let refresh = RefreshClaims {
            jti: Uuid::new_v4(),
            access_token: access_token.clone(),
            id: user.id,
            expiry: now + self.refresh_ttl.as_secs() as i64,
            platform,
        };
        let refresh_token = self.codec.encode_refresh(&refresh, &self.refresh_secret)?;

        let entry = AccessEntry {
            claims: access,
            refresh_token: refresh_token.clone(),
        };
        self.store(&access_token, &entry, self.access_ttl).await?;

        if let Err(e) = self.store(&refresh_token, &refresh, self.refresh_ttl).await {
            // Do not leave an access token whose refresh half was never stored
            if let Err(cleanup) = self.bounded(self.cache.delete(&access_token)).await {
                warn!("failed to drop orphaned access token: {cleanup}");
            }
            return Err(e);
        }

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Resolves the principal behind an access token.
    pub async fn verify(&self, access_token: &str) -> Result<Principal, AuthError> {
        self.session(access_token).await.map(|s| s.principal)
    }

    /// Like [`SessionManager::verify`], but keeps both raw tokens so the
    /// session can be revoked later.
    #[instrument(skip_all)]
    pub async fn session(&self, access_token: &str) -> Result<AuthSession, AuthError> {
        let raw = self
            .bounded(self.cache.get(access_token))
            .await
            .map_err(AuthError::CacheRead)?
            .ok_or(AuthError::Unauthenticated)?;

        let entry: AccessEntry = serde_json::from_str(&raw).map_err(|e| {
            warn!("discarding unreadable session entry: {e}");
            AuthError::Unauthenticated
        })?;

        // Entries can outlive their TTL on a lagging backend
        if entry.claims.expiry <= Utc::now().timestamp() {
            return Err(AuthError::Unauthenticated);
        }

        Ok(AuthSession {
            principal: Principal::from(&entry.claims),
            access_token: access_token.to_string(),
            refresh_token: entry.refresh_token,
        })
    }

    /// Retires the pair behind `refresh_token` and issues a replacement.
    ///
    /// Every failure before the old pair is touched leaves the cache as it
    /// was. Once the old pair is gone, any failure is reported as
    /// [`AuthError::RotationIncomplete`] and the caller has to sign in again.
    #[instrument(skip_all)]
    pub async fn rotate(
        &self,
        refresh_token: &str,
        platform: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        self.bounded(self.cache.get(refresh_token))
            .await
            .map_err(AuthError::CacheRead)?
            .ok_or(AuthError::Unauthenticated)?;

        let claims = self
            .codec
            .decode_refresh(refresh_token, &self.refresh_secret)
            .map_err(|e| {
                warn!("cached refresh token failed verification: {e}");
                AuthError::Unauthenticated
            })?;
        if claims.expiry <= Utc::now().timestamp() {
            return Err(AuthError::Unauthenticated);
        }

        let user = self
            .lookup(self.users.find_by_id(claims.id))
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.id, "refresh token belongs to a missing user");
                AuthError::PrincipalNotFound
            })?;

        let retired = self
            .bounded(self.cache.retire_pair(refresh_token, &claims.access_token))
            .await
            .map_err(|e| AuthError::RotationIncomplete(Box::new(AuthError::CacheWrite(e))))?;
        if !retired {
            // A concurrent rotation got here first
            return Err(AuthError::Unauthenticated);
        }

        let pair = self
            .issue(&user, platform)
            .await
            .map_err(|e| AuthError::RotationIncomplete(Box::new(e)))?;
        info!(user_id = %user.id, "session rotated");
        Ok(pair)
    }

    /// Deletes both tokens of a pair. Safe to call repeatedly.
    #[instrument(skip_all)]
    pub async fn revoke(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError> {
        self.bounded(self.cache.retire_pair(refresh_token, access_token))
            .await
            .map_err(AuthError::CacheWrite)?;
        Ok(())
    }

    async fn store<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let payload =
            serde_json::to_string(value).map_err(|e| AuthError::CacheWrite(CacheError::from(e)))?;
        let stored = self
            .bounded(self.cache.put(key, &payload, ttl))
            .await
            .map_err(AuthError::CacheWrite)?;
        if !stored {
            return Err(AuthError::CacheWrite(CacheError::Rejected));
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))?
    }

    async fn lookup(
        &self,
        op: impl Future<Output = Result<Option<User>, sqlx::Error>>,
    ) -> Result<Option<User>, AuthError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| AuthError::UserStoreTimeout)?
            .map_err(AuthError::from)
    }
}
