//! Postgres-backed account and OTP stores.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{
    Account, CreateOutcome, NewAccount, OtpPurpose, OtpRecord, OtpStore, Role, UserStore,
};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Account {
    let role: String = row.get("role");

    Account {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        age: row.get("age"),
        contact_number: row.get("contact_number"),
        password_hash: row.get("password_hash"),
        verified: row.get("verified"),
        role: Role::from_db(&role),
        token_version: row.get("token_version"),
        last_login: row.get("last_login"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome> {
        // Uniqueness rides on the email constraint; a racing duplicate insert
        // surfaces as a unique violation, never as a second row.
        let query = r"
            INSERT INTO accounts (email, name, age, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, age, contact_number, password_hash,
                      verified, role, token_version, last_login
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&account.email)
            .bind(&account.name)
            .bind(account.age)
            .bind(&account.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(account_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::DuplicateEmail),
            Err(err) => Err(err).context("failed to insert account"),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = r"
            SELECT id, email, name, age, contact_number, password_hash,
                   verified, role, token_version, last_login
            FROM accounts
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by email")?;

        Ok(row.map(|row| account_from_row(&row)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = r"
            SELECT id, email, name, age, contact_number, password_hash,
                   verified, role, token_version, last_login
            FROM accounts
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by id")?;

        Ok(row.map(|row| account_from_row(&row)))
    }

    async fn mark_verified(&self, email: &str) -> Result<Option<Account>> {
        let query = r"
            UPDATE accounts
            SET verified = TRUE, updated_at = NOW()
            WHERE email = $1
            RETURNING id, email, name, age, contact_number, password_hash,
                      verified, role, token_version, last_login
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark account verified")?;

        Ok(row.map(|row| account_from_row(&row)))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        let query = r"
            UPDATE accounts
            SET last_login = NOW(), updated_at = NOW()
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update last login")?;

        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        // Hash write and version bump share one statement so a concurrent
        // refresh sees either the old version or the new one, never a mix.
        let query = r"
            UPDATE accounts
            SET password_hash = $2,
                token_version = token_version + 1,
                updated_at = NOW()
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password")?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgOtpStore {
    pool: PgPool,
}

impl PgOtpStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn upsert(&self, record: &OtpRecord) -> Result<()> {
        // Last write wins on the single per-email record.
        let query = r"
            INSERT INTO email_otps (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET code = EXCLUDED.code,
                purpose = EXCLUDED.purpose,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&record.email)
            .bind(&record.code)
            .bind(record.purpose.as_str())
            .bind(record.expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to upsert one-time code")?;

        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<OtpRecord>> {
        let query = r"
            SELECT email, code, purpose, expires_at
            FROM email_otps
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup one-time code")?;

        Ok(row.map(|row| {
            let purpose: String = row.get("purpose");
            OtpRecord {
                email: row.get("email"),
                code: row.get("code"),
                purpose: OtpPurpose::from_db(&purpose),
                expires_at: row.get("expires_at"),
            }
        }))
    }

    async fn delete(&self, email: &str) -> Result<()> {
        let query = "DELETE FROM email_otps WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(email)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete one-time code")?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
