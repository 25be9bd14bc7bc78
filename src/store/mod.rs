//! Store contracts for accounts and one-time codes.
//!
//! The auth flows only ever touch these traits; the Postgres implementations
//! are the production wiring and an in-memory pair backs the test suite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub type DynUserStore = Arc<dyn UserStore>;
pub type DynOtpStore = Arc<dyn OtpStore>;

/// Account role. Anything the database holds outside these two values is
/// treated as a plain user.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// A durable account record.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub contact_number: Option<String>,
    pub password_hash: String,
    pub verified: bool,
    pub role: Role,
    pub token_version: i64,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields needed to create an account; everything else starts at its default
/// (unverified, user role, token version zero).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub password_hash: String,
}

/// Outcome when attempting to create an account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Account),
    DuplicateEmail,
}

/// What a one-time code was issued for. Stored alongside the code; lookups
/// are by email alone, so a newer request of either purpose replaces the
/// previous record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "password_reset" => Self::PasswordReset,
            _ => Self::EmailVerification,
        }
    }
}

/// A pending one-time code. At most one per email.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
}

/// Durable account store.
///
/// Emails are expected to be normalized (trimmed, lowercased) before any
/// call; uniqueness is enforced by the store itself, not by pre-checks.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account, reporting a duplicate email as an outcome rather
    /// than an error.
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Flip `verified` to true, returning the updated account or `None` if
    /// the email is unknown.
    async fn mark_verified(&self, email: &str) -> Result<Option<Account>>;

    /// Record a successful login timestamp.
    async fn touch_last_login(&self, id: Uuid) -> Result<()>;

    /// Store a new password hash and bump `token_version` in one atomic
    /// update, revoking every refresh token issued before it. Returns false
    /// if the email is unknown.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool>;
}

/// Ephemeral one-time-code store keyed by email.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Insert or replace the single record for the email.
    async fn upsert(&self, record: &OtpRecord) -> Result<()>;

    async fn find(&self, email: &str) -> Result<Option<OtpRecord>>;

    /// Delete the record if present; deleting a missing record is not an
    /// error.
    async fn delete(&self, email: &str) -> Result<()>;
}
