use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::models::auth::{AccessClaims, RefreshClaims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key is empty")]
    EmptyKey,

    #[error("failed to sign token")]
    Signature(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with a single pinned algorithm.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
}

impl TokenCodec {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    /// `signing_key` is the owner's password hash.
    pub fn encode_access(&self, claims: &AccessClaims, signing_key: &str) -> Result<String, TokenError> {
        self.sign(claims, signing_key)
    }

    pub fn encode_refresh(&self, claims: &RefreshClaims, secret: &str) -> Result<String, TokenError> {
        self.sign(claims, secret)
    }

    pub fn decode_access(&self, token: &str, signing_key: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, signing_key)
    }

    /// Checks signature and algorithm only. `expiry` is left to the caller.
    pub fn decode_refresh(&self, token: &str, secret: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token, secret)
    }

    fn sign<T: Serialize>(&self, claims: &T, key: &str) -> Result<String, TokenError> {
        if key.is_empty() {
            return Err(TokenError::EmptyKey);
        }
        encode(
            &Header::new(self.algorithm),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(TokenError::Signature)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, key: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Our claims carry `expiry`, not the registered `exp`; lifetime is enforced by the cache.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<T>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
            .map_err(TokenError::Invalid)?;
        Ok(data.claims)
    }
}
