//! Login: verify credentials, then either grant a session or push the user
//! back into email verification.

use super::{
    session::grant_session,
    state::AuthState,
    types::{LoginRequest, MessageResponse, SessionResponse},
    utils,
};
use crate::api::email::verification_email;
use crate::store::{Account, DynOtpStore, DynUserStore, OtpPurpose, OtpRecord};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

// Unknown email and wrong password answer identically.
fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse::fail("Invalid email or password")),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Validation failed", body = MessageResponse),
        (status = 401, description = "Invalid email or password", body = MessageResponse),
        (status = 403, description = "Email not verified, code re-sent", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(users): Extension<DynUserStore>,
    Extension(otps): Extension<DynOtpStore>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return utils::validation_failed();
    };

    let email = utils::normalize_email(&request.email);

    if !utils::valid_email(&email) || request.password.is_empty() {
        return utils::validation_failed();
    }

    let account = match users.find_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials(),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    };

    match utils::verify_password(&request.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(err) => {
            error!("{err:#}");
            return utils::server_error();
        }
    }

    if !account.verified {
        return resend_verification(&otps, &state, &account).await;
    }

    match grant_session(&state, &users, &account, "Login successful").await {
        Ok((headers, body)) => (StatusCode::OK, headers, Json(body)).into_response(),
        Err(err) => {
            error!("{err:#}");
            utils::server_error()
        }
    }
}

/// Credentials were right but the email is unverified; re-issue a code and
/// refuse the session.
async fn resend_verification(
    otps: &DynOtpStore,
    state: &AuthState,
    account: &Account,
) -> Response {
    let code = utils::generate_otp();
    let record = OtpRecord {
        email: account.email.clone(),
        code: code.clone(),
        purpose: OtpPurpose::EmailVerification,
        expires_at: utils::otp_expiry(state.config().otp_ttl_seconds()),
    };

    if let Err(err) = otps.upsert(&record).await {
        error!("{err:#}");
        return utils::server_error();
    }

    let message = verification_email(&account.email, &code, state.config().otp_ttl_minutes());
    if let Err(err) = state.mailer().send(&message) {
        error!("Failed to send verification email: {err:#}");
    }

    (
        StatusCode::FORBIDDEN,
        Json(MessageResponse::fail(
            "Email not verified. A new OTP has been sent to your email.",
        )),
    )
        .into_response()
}
