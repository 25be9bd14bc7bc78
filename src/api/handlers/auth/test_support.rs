//! Shared fixtures for the auth handler tests: in-memory stores, a signer
//! with a fixed secret, and mail senders that record or fail.

use super::state::{AuthConfig, AuthState};
use crate::api::email::{EmailMessage, EmailSender};
use crate::store::{
    memory::{MemoryOtpStore, MemoryUserStore},
    Account, CreateOutcome, DynOtpStore, DynUserStore, NewAccount,
};
use anyhow::{bail, Result};
use axum::{body::to_bytes, http::StatusCode, response::Response};
use secrecy::SecretString;
use std::sync::{Arc, Mutex};

/// Captures outbound messages so tests can read the generated codes.
#[derive(Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingSender {
    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().expect("sender lock poisoned").len()
    }

    pub(crate) fn last_message(&self) -> Option<EmailMessage> {
        self.sent.lock().expect("sender lock poisoned").last().cloned()
    }

    /// Six-digit code embedded in the most recent message body.
    pub(crate) fn last_code(&self) -> Option<String> {
        let message = self.last_message()?;

        message
            .body
            .split_whitespace()
            .find(|word| word.len() == 6 && word.bytes().all(|byte| byte.is_ascii_digit()))
            .map(str::to_string)
    }
}

impl EmailSender for RecordingSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent
            .lock()
            .expect("sender lock poisoned")
            .push(message.clone());

        Ok(())
    }
}

/// Sender that always errors, for the delivery-failure paths.
pub(crate) struct FailingSender;

impl EmailSender for FailingSender {
    fn send(&self, _message: &EmailMessage) -> Result<()> {
        bail!("smtp unavailable")
    }
}

pub(crate) struct Harness {
    pub(crate) users: DynUserStore,
    pub(crate) otps: DynOtpStore,
    pub(crate) state: Arc<AuthState>,
    pub(crate) mailer: Arc<RecordingSender>,
}

pub(crate) fn secret() -> SecretString {
    SecretString::from("0123456789abcdef0123456789abcdef".to_string())
}

pub(crate) fn harness(config: AuthConfig) -> Harness {
    let mailer = Arc::new(RecordingSender::default());

    Harness {
        users: Arc::new(MemoryUserStore::new()),
        otps: Arc::new(MemoryOtpStore::new()),
        state: Arc::new(AuthState::new(config, &secret(), mailer.clone())),
        mailer,
    }
}

pub(crate) fn harness_with_failing_mail(config: AuthConfig) -> Harness {
    let harness = harness(config.clone());

    Harness {
        state: Arc::new(AuthState::new(config, &secret(), Arc::new(FailingSender))),
        ..harness
    }
}

/// Insert an account directly, bypassing the register handler. Uses a low
/// bcrypt cost to keep the suite fast.
pub(crate) async fn seed_account(
    harness: &Harness,
    email: &str,
    password: &str,
    verified: bool,
) -> Account {
    let password_hash = bcrypt::hash(password, 4).expect("hash password");

    let outcome = harness
        .users
        .create(NewAccount {
            email: email.to_string(),
            name: "Asha".to_string(),
            age: Some(30),
            password_hash,
        })
        .await
        .expect("create account");

    let CreateOutcome::Created(account) = outcome else {
        panic!("account already seeded: {email}");
    };

    if verified {
        harness
            .users
            .mark_verified(email)
            .await
            .expect("mark verified")
            .expect("account exists")
    } else {
        account
    }
}

/// Refresh-token value from the response's `Set-Cookie` header, if any.
pub(crate) fn cookie_token(response: &Response) -> Option<String> {
    let header = response
        .headers()
        .get(axum::http::header::SET_COOKIE)?
        .to_str()
        .ok()?;

    header
        .strip_prefix("refreshToken=")?
        .split(';')
        .next()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Consume a response into its status and JSON body.
pub(crate) async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).expect("json body");

    (status, value)
}

pub(crate) fn message_of(value: &serde_json::Value) -> &str {
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
}
