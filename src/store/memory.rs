//! In-memory stores backing the unit-test suite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Account, CreateOutcome, NewAccount, OtpRecord, OtpStore, Role, UserStore};

#[derive(Default)]
pub(crate) struct MemoryUserStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.email) {
            return Ok(CreateOutcome::DuplicateEmail);
        }

        let record = Account {
            id: Uuid::new_v4(),
            email: account.email.clone(),
            name: account.name,
            age: account.age,
            contact_number: None,
            password_hash: account.password_hash,
            verified: false,
            role: Role::User,
            token_version: 0,
            last_login: None,
        };
        accounts.insert(account.email, record.clone());

        Ok(CreateOutcome::Created(record))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.id == id)
            .cloned())
    }

    async fn mark_verified(&self, email: &str) -> Result<Option<Account>> {
        let mut accounts = self.accounts.write().await;

        Ok(accounts.get_mut(email).map(|account| {
            account.verified = true;
            account.clone()
        }))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        let mut accounts = self.accounts.write().await;

        if let Some(account) = accounts.values_mut().find(|account| account.id == id) {
            account.last_login = Some(Utc::now());
        }

        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut accounts = self.accounts.write().await;

        match accounts.get_mut(email) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.token_version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryOtpStore {
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn upsert(&self, record: &OtpRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.email.clone(), record.clone());

        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<OtpRecord>> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn delete(&self, email: &str) -> Result<()> {
        self.records.write().await.remove(email);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OtpPurpose;
    use chrono::Duration;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            name: "Asha".to_string(),
            age: Some(30),
            password_hash: "$2b$12$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() -> anyhow::Result<()> {
        let store = MemoryUserStore::new();

        let first = store.create(new_account("asha@example.com")).await?;
        assert!(matches!(first, CreateOutcome::Created(_)));

        let second = store.create(new_account("asha@example.com")).await?;
        assert!(matches!(second, CreateOutcome::DuplicateEmail));

        assert_eq!(store.accounts.read().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_password_bumps_token_version() -> anyhow::Result<()> {
        let store = MemoryUserStore::new();
        store.create(new_account("asha@example.com")).await?;

        assert!(store.update_password("asha@example.com", "$2b$12$new").await?);

        let account = store.find_by_email("asha@example.com").await?.unwrap();
        assert_eq!(account.token_version, 1);
        assert_eq!(account.password_hash, "$2b$12$new");

        assert!(!store.update_password("nobody@example.com", "$2b$12$x").await?);
        Ok(())
    }

    #[tokio::test]
    async fn mark_verified_returns_updated_account() -> anyhow::Result<()> {
        let store = MemoryUserStore::new();
        store.create(new_account("asha@example.com")).await?;

        let account = store.mark_verified("asha@example.com").await?.unwrap();
        assert!(account.verified);

        assert!(store.mark_verified("nobody@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn otp_upsert_replaces_previous_record() -> anyhow::Result<()> {
        let store = MemoryOtpStore::new();
        let expires_at = Utc::now() + Duration::minutes(10);

        store
            .upsert(&OtpRecord {
                email: "asha@example.com".to_string(),
                code: "111111".to_string(),
                purpose: OtpPurpose::EmailVerification,
                expires_at,
            })
            .await?;
        store
            .upsert(&OtpRecord {
                email: "asha@example.com".to_string(),
                code: "222222".to_string(),
                purpose: OtpPurpose::PasswordReset,
                expires_at,
            })
            .await?;

        let record = store.find("asha@example.com").await?.unwrap();
        assert_eq!(record.code, "222222");
        assert_eq!(record.purpose, OtpPurpose::PasswordReset);
        assert_eq!(store.records.read().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn otp_delete_is_idempotent() -> anyhow::Result<()> {
        let store = MemoryOtpStore::new();

        store.delete("asha@example.com").await?;
        store.delete("asha@example.com").await?;

        assert!(store.find("asha@example.com").await?.is_none());
        Ok(())
    }
}
