//! Shared configuration and collaborators for the auth handlers.

use crate::api::email::EmailSender;
use crate::token::TokenSigner;
use chrono::Duration;
use secrecy::SecretString;
use std::sync::Arc;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_OTP_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_RESET_TTL_SECONDS: i64 = 10 * 60;

/// Tunables for token lifetimes and cookie attributes.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    otp_ttl_seconds: i64,
    reset_ttl_seconds: i64,
    secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
            secure_cookies: false,
        }
    }

    #[must_use]
    pub const fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub const fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub const fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub const fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    /// Rounded up so the email copy never promises less time than the code has.
    #[must_use]
    pub const fn otp_ttl_minutes(&self) -> i64 {
        (self.otp_ttl_seconds + 59) / 60
    }

    #[must_use]
    pub const fn reset_ttl_seconds(&self) -> i64 {
        self.reset_ttl_seconds
    }

    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// Everything the auth handlers share across requests: the signer built from
/// the token secret, the outbound mailer, and the config itself.
pub struct AuthState {
    config: AuthConfig,
    signer: TokenSigner,
    mailer: Arc<dyn EmailSender>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, token_secret: &SecretString, mailer: Arc<dyn EmailSender>) -> Self {
        let signer = TokenSigner::new(
            token_secret,
            Duration::seconds(config.access_ttl_seconds()),
            Duration::seconds(config.refresh_ttl_seconds()),
            Duration::seconds(config.reset_ttl_seconds()),
        );

        Self {
            config,
            signer,
            mailer,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub const fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub(crate) fn mailer(&self) -> &dyn EmailSender {
        self.mailer.as_ref()
    }
}
