//! # Prana (Authentication & Credential Lifecycle)
//!
//! `prana` is the authentication backend of the Prana wellness platform. It
//! owns registration with email verification, login, JWT access/refresh token
//! issuance, OTP-based password reset, and token revocation.
//!
//! ## Accounts & Verification
//!
//! Accounts are created unverified; a 6-digit one-time code delivered by
//! email flips `verified` exactly once. Unverified accounts can log in with
//! the correct password but never receive tokens; each attempt issues a fresh
//! code instead.
//!
//! - **Email Normalization:** Emails are trimmed and lowercased before any
//!   lookup; uniqueness is enforced by the database, not by pre-checks.
//! - **One code per email:** A newer code request of either purpose replaces
//!   the previous record; codes are single-use and expire after their TTL.
//!
//! ## Tokens & Revocation
//!
//! Three HS256 JWT classes share one symmetric secret: short-lived access
//! tokens (in-body), long-lived refresh tokens (HttpOnly cookie, never in a
//! body payload), and single-purpose password-reset tokens. Refresh tokens
//! embed the account's `token_version` at issuance; a password reset bumps
//! the counter and thereby invalidates every outstanding refresh token.
//! There is no per-token revocation list.

pub mod api;
pub mod cli;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
