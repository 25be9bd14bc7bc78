//! Registration: create the account and email the first verification code.

use super::{
    state::AuthState,
    types::{MessageResponse, RegisterRequest},
    utils,
};
use crate::api::email::verification_email;
use crate::store::{CreateOutcome, DynOtpStore, DynUserStore, NewAccount, OtpPurpose, OtpRecord};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::error;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification code emailed", body = MessageResponse),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(users): Extension<DynUserStore>,
    Extension(otps): Extension<DynOtpStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    let email = utils::normalize_email(&request.email);
    let name = request.name.trim();

    if !utils::valid_email(&email)
        || name.is_empty()
        || !utils::valid_password(&request.password)
        || request.age.is_some_and(|age| age <= 0)
    {
        return utils::validation_failed();
    }

    let password_hash = match utils::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    let outcome = users
        .create(NewAccount {
            email: email.clone(),
            name: name.to_string(),
            age: request.age,
            password_hash,
        })
        .await;

    match outcome {
        Ok(CreateOutcome::DuplicateEmail) => (
            StatusCode::CONFLICT,
            Json(MessageResponse::fail("Email already registered")),
        )
            .into_response(),

        Ok(CreateOutcome::Created(_)) => {
            let code = utils::generate_otp();
            let record = OtpRecord {
                email: email.clone(),
                code: code.clone(),
                purpose: OtpPurpose::EmailVerification,
                expires_at: utils::otp_expiry(state.config().otp_ttl_seconds()),
            };

            if let Err(err) = otps.upsert(&record).await {
                error!("{err:#}");
                return utils::server_error();
            }

            // The account exists either way; a failed send only costs the
            // user a resend via send-otp.
            let message = verification_email(&email, &code, state.config().otp_ttl_minutes());
            if let Err(err) = state.mailer().send(&message) {
                error!("Failed to send verification email: {err:#}");
            }

            (
                StatusCode::CREATED,
                Json(MessageResponse::ok(
                    "User registered. Check your email for the OTP to verify your account.",
                )),
            )
                .into_response()
        }

        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}
