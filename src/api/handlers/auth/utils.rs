//! Validation, code generation and password hashing helpers shared by the
//! auth handlers.

use super::types::MessageResponse;
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use regex::Regex;

pub(super) const MIN_PASSWORD_LEN: usize = 6;

const BCRYPT_COST: u32 = 12;

/// Emails are matched case-insensitively; normalize before any lookup or
/// write so `Foo@Bar.com ` and `foo@bar.com` hit the same row.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Liberal shape check on an already-normalized email: something@something
/// with a dot in the domain, no whitespace.
pub(super) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub(super) fn valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}

pub(super) fn valid_otp_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|byte| byte.is_ascii_digit())
}

/// Uniform six digits, zero-padded.
pub(super) fn generate_otp() -> String {
    let mut rng = rand::thread_rng();

    format!("{:06}", rng.gen_range(0..1_000_000))
}

pub(super) fn otp_expiry(ttl_seconds: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(ttl_seconds)
}

/// # Errors
///
/// Returns an error if bcrypt fails, for example on an over-long input.
pub(super) fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("Failed to hash password")
}

/// # Errors
///
/// Returns an error if the stored hash cannot be parsed.
pub(super) fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

pub(super) fn validation_failed() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse::fail("Validation failed")),
    )
        .into_response()
}

pub(super) fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::fail("Server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn email_shapes() {
        assert!(valid_email("asha@example.com"));
        assert!(valid_email("a.b+c@sub.example.co"));
        assert!(!valid_email("asha@example"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("asha@"));
        assert!(!valid_email("asha example@x.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn password_minimum_length() {
        assert!(valid_password("secret"));
        assert!(!valid_password("short"));
    }

    #[test]
    fn otp_code_shape() {
        assert!(valid_otp_code("012345"));
        assert!(!valid_otp_code("12345"));
        assert!(!valid_otp_code("1234567"));
        assert!(!valid_otp_code("12345a"));
        assert!(!valid_otp_code("12 345"));
    }

    #[test]
    fn generated_otp_is_six_digits() {
        for _ in 0..32 {
            assert!(valid_otp_code(&generate_otp()));
        }
    }

    #[test]
    fn otp_expiry_is_in_the_future() {
        let expires_at = otp_expiry(600);
        assert!(expires_at > Utc::now());
    }

    #[test]
    fn password_hash_round_trip() -> Result<()> {
        let hash = hash_password("hunter22")?;

        assert!(verify_password("hunter22", &hash)?);
        assert!(!verify_password("hunter23", &hash)?);
        Ok(())
    }
}
