//! Signing and verification of the three token classes: access, refresh and
//! password-reset. All tokens are HS256 JWTs signed with one shared secret;
//! callers pick the claims shape and validate purpose after decode.

use crate::store::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Purpose claim value accepted by the reset-password operation.
pub const RESET_PURPOSE: &str = "password_reset";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,

    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. The embedded `token_version` is
/// compared against the account's current value on every refresh; a mismatch
/// means the token was revoked by a password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub token_version: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a single-purpose password-reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies all token classes with a single symmetric secret.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(
        secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
        reset_ttl: Duration,
    ) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl,
            refresh_ttl,
            reset_ttl,
        }
    }

    /// Sign an access token for a verified account.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized or signed.
    pub fn access_token(&self, id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();

        self.sign(&AccessClaims {
            sub: id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        })
    }

    /// Sign a refresh token pinned to the account's current token version.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized or signed.
    pub fn refresh_token(&self, id: Uuid, token_version: i64) -> Result<String, TokenError> {
        let now = Utc::now();

        self.sign(&RefreshClaims {
            sub: id,
            token_version,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        })
    }

    /// Sign a password-reset token for the given email.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized or signed.
    pub fn reset_token(&self, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();

        self.sign(&ResetClaims {
            email: email.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        })
    }

    /// Verify signature and expiry, decoding into access claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] for a signature-valid but expired
    /// token, [`TokenError::InvalidSignature`] or [`TokenError::Malformed`]
    /// otherwise.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token)
    }

    /// Verify signature and expiry, decoding into refresh claims.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::verify_access`].
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token)
    }

    /// Verify signature and expiry, decoding into reset claims. The purpose
    /// claim is returned as-is; the caller decides whether it is acceptable.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::verify_access`].
    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, TokenError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Sign)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}
