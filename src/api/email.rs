//! Email delivery abstraction for one-time codes.
//!
//! The auth flows build an [`EmailMessage`] and hand it to an [`EmailSender`].
//! The sender decides how to deliver (SMTP, API, etc.) and returns `Ok`/`Err`;
//! each flow decides whether a failure is fatal (send-otp, forgot-password)
//! or logged and swallowed (registration, unverified-login resend).
//!
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`.

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction used by the auth flows.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the caller can decide whether
    /// the failure is fatal for its flow.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// Message carrying a verification code for a new or unverified account.
#[must_use]
pub fn verification_email(to_email: &str, code: &str, ttl_minutes: i64) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Your Prana verification code".to_string(),
        body: format!(
            "Enter the following code to verify your email address: {code}\n\
             This code will expire in {ttl_minutes} minutes."
        ),
    }
}

/// Message carrying a password-reset code.
#[must_use]
pub fn password_reset_email(to_email: &str, code: &str, ttl_minutes: i64) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Reset your Prana password".to_string(),
        body: format!(
            "Use the following code to reset your Prana account password: {code}\n\
             This code will expire in {ttl_minutes} minutes. If you didn't \
             request this, please ignore this email."
        ),
    }
}
